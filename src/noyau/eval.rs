//! Noyau : évaluation (aiguillage des modes)
//!
//! texte -> traducteur -> Expr -> constantes/alias -> appel moteur (selon le mode)
//!       -> (numérique seulement) formateur -> Sortie
//!
//! Chaque invocation est indépendante : l’évaluateur ne garde que sa configuration,
//! figée à la construction (table des constantes + décimales).

use std::fmt;

use tracing::debug;

use super::constantes::TableConstantes;
use super::erreur::ErreurEval;
use super::expr::{Constante, Expr};
use super::format::{formater, ResultatFormate};
use super::moteur::{Egalite, MoteurAlgebre, MoteurExact, Traducteur, TraducteurLatex};

/// Décimales par défaut du formateur.
pub const DECIMALES_PAR_DEFAUT: i32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Numerique,
    Symbolique,
    Resolution,
    Derivation,
}

/// Une commande = un mode + ses arguments bruts (balisage).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Commande {
    Numerique {
        expr: String,
    },
    Symbolique {
        expr: String,
    },
    Resolution {
        gauche: String,
        droite: String,
        var: String,
    },
    Derivation {
        expr: String,
        symboles: Vec<String>,
        var: String,
    },
}

impl Commande {
    pub fn mode(&self) -> Mode {
        match self {
            Commande::Numerique { .. } => Mode::Numerique,
            Commande::Symbolique { .. } => Mode::Symbolique,
            Commande::Resolution { .. } => Mode::Resolution,
            Commande::Derivation { .. } => Mode::Derivation,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Sortie {
    Numerique(ResultatFormate),
    Symbolique(String),
    Solution { var: String, valeur: String },
    /// Texte brut (pas du balisage), contrairement aux autres modes.
    Derivee(String),
}

/// Texte de sortie tel qu’imprimé par la ligne de commande (sans fin de ligne).
impl fmt::Display for Sortie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sortie::Numerique(r) => write!(f, "{r}"),
            Sortie::Symbolique(m) => write!(f, " = {m}"),
            Sortie::Solution { var, valeur } => write!(f, "{var} = {valeur}"),
            Sortie::Derivee(t) => f.write_str(t),
        }
    }
}

/// Configuration explicite de l’évaluateur ; seule la construction la modifie.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigEvaluateur {
    pub table: TableConstantes,
    pub decimales: i32,
}

impl Default for ConfigEvaluateur {
    fn default() -> Self {
        Self {
            table: TableConstantes::par_defaut(),
            decimales: DECIMALES_PAR_DEFAUT,
        }
    }
}

pub struct Evaluateur<T = TraducteurLatex, M = MoteurExact> {
    config: ConfigEvaluateur,
    traducteur: T,
    moteur: M,
}

impl Evaluateur {
    pub fn new(config: ConfigEvaluateur) -> Self {
        Self::avec_moteurs(config, TraducteurLatex, MoteurExact)
    }
}

impl Default for Evaluateur {
    fn default() -> Self {
        Self::new(ConfigEvaluateur::default())
    }
}

impl<T: Traducteur, M: MoteurAlgebre> Evaluateur<T, M> {
    pub fn avec_moteurs(config: ConfigEvaluateur, traducteur: T, moteur: M) -> Self {
        Self {
            config,
            traducteur,
            moteur,
        }
    }

    pub fn config(&self) -> &ConfigEvaluateur {
        &self.config
    }

    pub fn dispatch(&self, commande: &Commande) -> Result<Sortie, ErreurEval> {
        debug!(mode = ?commande.mode(), "dispatch");

        match commande {
            Commande::Numerique { expr } => self.numerique(expr),
            Commande::Symbolique { expr } => self.symbolique(expr),
            Commande::Resolution { gauche, droite, var } => self.resolution(gauche, droite, var),
            Commande::Derivation {
                expr,
                symboles,
                var,
            } => self.derivation(expr, symboles, var),
        }
    }

    fn traduire(&self, balisage: &str) -> Result<Expr, ErreurEval> {
        let arbre = self.traducteur.traduire(balisage)?;
        debug!(%balisage, arbre = %arbre, "traduit");
        Ok(arbre)
    }

    /// Le nom de variable passe par le traducteur (`\alpha`, `x_1`) et doit donner un symbole seul.
    fn nom_variable(&self, var: &str) -> Result<String, ErreurEval> {
        match self.traduire(var)? {
            Expr::Var(nom) => Ok(nom),
            _ => Err(ErreurEval::parse(format!("variable invalide: '{}'", var.trim()))),
        }
    }

    fn numerique(&self, expr: &str) -> Result<Sortie, ErreurEval> {
        let arbre = self.traduire(expr)?;
        let resolu = self.config.table.resoudre(&arbre);
        debug!(resolu = %resolu, "constantes résolues");

        let valeur = self.moteur.evaluer_numerique(&resolu)?;
        let r = formater(valeur, self.config.decimales)?;
        Ok(Sortie::Numerique(r))
    }

    fn symbolique(&self, expr: &str) -> Result<Sortie, ErreurEval> {
        let arbre = self.traduire(expr)?;
        let resolu = self.config.table.resoudre(&arbre);
        let simple = self.moteur.simplifier(&resolu);
        debug!(simple = %simple, "simplifié");
        Ok(Sortie::Symbolique(self.moteur.rendu_balisage(&simple)))
    }

    fn resolution(&self, gauche: &str, droite: &str, var: &str) -> Result<Sortie, ErreurEval> {
        let nom = self.nom_variable(var)?;
        let table = &self.config.table;

        // l’inconnue n’est jamais remplacée par une constante
        let egalite = Egalite::new(
            table.resoudre_sauf(&self.traduire(gauche)?, &nom),
            table.resoudre_sauf(&self.traduire(droite)?, &nom),
        );

        let solutions = self.moteur.resoudre(&egalite, &nom);
        debug!(var = %nom, n = solutions.len(), "solutions");

        // première solution dans l’ordre du moteur
        let premiere = solutions
            .first()
            .ok_or_else(|| ErreurEval::SansSolution(var.trim().to_string()))?;
        Ok(Sortie::Solution {
            var: var.trim().to_string(),
            valeur: self.moteur.rendu_balisage(premiere),
        })
    }

    fn derivation(&self, expr: &str, symboles: &[String], var: &str) -> Result<Sortie, ErreurEval> {
        let arbre = self.traduire(expr)?;
        let nom = self.nom_variable(var)?;
        self.moteur.declarer_symboles(symboles);

        let arbre = if nom == "e" {
            arbre
        } else {
            self.moteur
                .substituer(&arbre, "e", &Expr::Const(Constante::E))
        };

        let d = self.moteur.deriver(&arbre, &nom);
        debug!(var = %nom, derivee = %d, "dérivée");
        Ok(Sortie::Derivee(self.moteur.rendu_texte(&d)))
    }
}
