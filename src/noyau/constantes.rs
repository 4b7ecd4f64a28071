// src/noyau/constantes.rs
//
// Table des constantes (modifiable à la construction) + passe d’alias (fixe).
// - résolution : table utilisateur, puis alias (π, e, i, φ, γ et leurs graphies)
// - les deux passes sont idempotentes ; definir() refuse ce qui casserait ça
//
// Collision : un nom de la table qui est aussi un alias (ex: "e") n’est pas refusé.
// Le résultat dépend alors de l’ordre des passes (cas non défini) : on le signale
// par un warn! au moment de definir().

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::erreur::ErreurConstante;
use super::expr::{Constante, Expr};
use super::rpn::lire_latex;

const ALIAS: &[(&str, Constante)] = &[
    ("pi", Constante::Pi),
    ("π", Constante::Pi),
    ("e", Constante::E),
    ("ℯ", Constante::E),
    ("i", Constante::I),
    ("ⅈ", Constante::I),
    ("phi", Constante::Phi),
    ("varphi", Constante::Phi),
    ("φ", Constante::Phi),
    ("ϕ", Constante::Phi),
    ("gamma", Constante::Gamma),
    ("γ", Constante::Gamma),
];

/// Constante mathématique désignée par `nom`, s’il s’agit d’un alias.
pub fn alias(nom: &str) -> Option<Constante> {
    ALIAS.iter().find(|(n, _)| *n == nom).map(|(_, c)| *c)
}

/// Passe d’alias seule ; `exclu` n’est jamais remplacé.
pub fn appliquer_alias(e: &Expr, exclu: Option<&str>) -> Expr {
    e.substitue_avec(&|s| {
        if Some(s) == exclu {
            return None;
        }
        alias(s).map(Expr::Const)
    })
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableConstantes {
    entrees: BTreeMap<String, Expr>,
}

impl TableConstantes {
    pub fn vide() -> Self {
        Self::default()
    }

    /// Jeu par défaut : c = 3·10^8.
    pub fn par_defaut() -> Self {
        let mut entrees = BTreeMap::new();
        entrees.insert("c".to_string(), Expr::entier(300_000_000));
        Self { entrees }
    }

    /// Ajoute ou remplace une entrée.
    pub fn definir(&mut self, nom: &str, valeur: Expr) -> Result<(), ErreurConstante> {
        if nom.trim().is_empty() {
            return Err(ErreurConstante::NomVide);
        }

        // la valeur ne doit nommer aucune entrée (ni elle-même)
        for s in valeur.symboles_libres() {
            if s == nom || self.entrees.contains_key(&s) {
                return Err(ErreurConstante::Cycle {
                    nom: nom.to_string(),
                    symbole: s,
                });
            }
        }
        // et aucune valeur existante ne doit nommer la nouvelle entrée
        for (autre, v) in &self.entrees {
            if autre != nom && v.contient_var(nom) {
                return Err(ErreurConstante::Cycle {
                    nom: autre.clone(),
                    symbole: nom.to_string(),
                });
            }
        }

        if let Some(c) = alias(nom) {
            warn!(nom, constante = ?c, "la constante masque un alias (ordre des passes non défini)");
        }

        debug!(nom, valeur = %valeur, "constante définie");
        self.entrees.insert(nom.to_string(), valeur);
        Ok(())
    }

    /// Entrée numérique (ex: lue d’un fichier de réglages).
    /// La valeur est reprise exactement depuis son écriture décimale.
    pub fn definir_nombre(&mut self, nom: &str, valeur: f64) -> Result<(), ErreurConstante> {
        let expr = if valeur.is_finite() {
            lire_latex(&format!("{valeur}")).ok()
        } else {
            None
        };
        match expr {
            Some(e) => self.definir(nom, e),
            None => {
                warn!(nom, valeur, "valeur non finie ignorée");
                Ok(())
            }
        }
    }

    pub fn get(&self, nom: &str) -> Option<&Expr> {
        self.entrees.get(nom)
    }

    pub fn noms(&self) -> impl Iterator<Item = &str> {
        self.entrees.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entrees.is_empty()
    }

    /// Table utilisateur, puis alias.
    pub fn resoudre(&self, e: &Expr) -> Expr {
        self.resoudre_avec(e, None)
    }

    /// Comme `resoudre`, sans toucher à `exclu` (inconnue du mode solve).
    pub fn resoudre_sauf(&self, e: &Expr, exclu: &str) -> Expr {
        self.resoudre_avec(e, Some(exclu))
    }

    fn resoudre_avec(&self, e: &Expr, exclu: Option<&str>) -> Expr {
        let table = e.substitue_avec(&|s| {
            if Some(s) == exclu {
                return None;
            }
            self.entrees.get(s).cloned()
        });
        appliquer_alias(&table, exclu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaut_vitesse_lumiere() {
        let t = TableConstantes::par_defaut();
        assert_eq!(t.get("c"), Some(&Expr::entier(300_000_000)));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn symboles_inconnus_intacts() {
        let t = TableConstantes::par_defaut();
        let e = Expr::mul(Expr::var("m"), Expr::pow(Expr::var("c"), Expr::entier(2)));
        let r = t.resoudre(&e);
        assert_eq!(
            r,
            Expr::mul(Expr::var("m"), Expr::pow(Expr::entier(300_000_000), Expr::entier(2)))
        );
    }

    #[test]
    fn alias_toutes_graphies() {
        let t = TableConstantes::vide();
        for (nom, c) in [("π", Constante::Pi), ("pi", Constante::Pi), ("ℯ", Constante::E), ("ϕ", Constante::Phi), ("γ", Constante::Gamma), ("i", Constante::I)] {
            assert_eq!(t.resoudre(&Expr::var(nom)), Expr::Const(c), "alias {nom}");
        }
        assert_eq!(t.resoudre(&Expr::var("Gamma")), Expr::var("Gamma"));
    }

    #[test]
    fn idempotence() {
        let mut t = TableConstantes::par_defaut();
        t.definir("g", Expr::rat(981, 100)).unwrap();
        let e = Expr::add(
            Expr::mul(Expr::var("g"), Expr::var("t")),
            Expr::mul(Expr::var("c"), Expr::var("pi")),
        );
        let une = t.resoudre(&e);
        assert_eq!(t.resoudre(&une), une);
    }

    #[test]
    fn exclusion_de_l_inconnue() {
        let t = TableConstantes::par_defaut();
        let e = Expr::add(Expr::var("c"), Expr::var("e"));
        assert_eq!(t.resoudre_sauf(&e, "c"), Expr::add(Expr::var("c"), Expr::Const(Constante::E)));
        assert_eq!(t.resoudre_sauf(&e, "e"), Expr::add(Expr::entier(300_000_000), Expr::var("e")));
    }

    #[test]
    fn refus_nom_vide_et_cycles() {
        let mut t = TableConstantes::par_defaut();
        assert_eq!(t.definir("", Expr::un()), Err(ErreurConstante::NomVide));
        assert!(matches!(t.definir("k", Expr::var("k")), Err(ErreurConstante::Cycle { .. })));
        assert!(matches!(t.definir("v", Expr::var("c")), Err(ErreurConstante::Cycle { .. })));

        t.definir("w", Expr::mul(Expr::entier(2), Expr::var("u"))).unwrap();
        let err = t.definir("u", Expr::un()).unwrap_err();
        assert_eq!(err, ErreurConstante::Cycle { nom: "w".into(), symbole: "u".into() });
    }

    #[test]
    fn collision_avec_alias_acceptee() {
        let mut t = TableConstantes::vide();
        t.definir("e", Expr::entier(5)).unwrap();
        // table d’abord : la valeur utilisateur gagne
        assert_eq!(t.resoudre(&Expr::var("e")), Expr::entier(5));
    }

    #[test]
    fn nombres_decimaux_exacts() {
        let mut t = TableConstantes::vide();
        t.definir_nombre("g", 9.81).unwrap();
        assert_eq!(t.get("g"), Some(&Expr::rat(981, 100)));
        t.definir_nombre("q", -2.0).unwrap();
        assert_eq!(t.get("q"), Some(&Expr::entier(-2)));
        t.definir_nombre("z", f64::NAN).unwrap();
        assert!(t.get("z").is_none());
    }
}
