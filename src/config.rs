// src/config.rs
//
// Réglages optionnels (fichier TOML) :
//
//   decimales = 4
//   [constantes]
//   g = 9.81
//   h = 6.62607015e-34
//
// Les constantes s’ajoutent au jeu par défaut ; une décimale passée en ligne de
// commande l’emporte sur le fichier.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::noyau::rpn::lire_latex;
use crate::noyau::{ConfigEvaluateur, ErreurConstante, Expr, TableConstantes, DECIMALES_PAR_DEFAUT};

#[derive(Debug, Error)]
pub enum ErreurReglages {
    #[error("cannot read settings file {}: {source}", .chemin.display())]
    Lecture {
        chemin: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings file {}: {source}", .chemin.display())]
    Syntaxe {
        chemin: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid constant name `{0}`: expected a single symbol")]
    NomConstante(String),

    #[error(transparent)]
    Constante(#[from] ErreurConstante),
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Reglages {
    pub decimales: Option<i32>,
    pub constantes: BTreeMap<String, f64>,
}

impl Reglages {
    pub fn charger(chemin: &Path) -> Result<Self, ErreurReglages> {
        let texte = fs::read_to_string(chemin).map_err(|source| ErreurReglages::Lecture {
            chemin: chemin.to_path_buf(),
            source,
        })?;
        let r: Reglages = toml::from_str(&texte).map_err(|source| ErreurReglages::Syntaxe {
            chemin: chemin.to_path_buf(),
            source,
        })?;
        debug!(chemin = %chemin.display(), constantes = r.constantes.len(), "réglages chargés");
        Ok(r)
    }

    /// Configuration figée de l’évaluateur ; `decimales` (ligne de commande) prime.
    pub fn vers_config(&self, decimales: Option<i32>) -> Result<ConfigEvaluateur, ErreurReglages> {
        let mut table = TableConstantes::par_defaut();
        for (cle, valeur) in &self.constantes {
            table.definir_nombre(&nom_de_constante(cle)?, *valeur)?;
        }
        Ok(ConfigEvaluateur {
            table,
            decimales: decimales.or(self.decimales).unwrap_or(DECIMALES_PAR_DEFAUT),
        })
    }
}

/// Une clé passe par le traducteur (`\alpha`, `g_{0}`) : elle doit donner un symbole seul.
fn nom_de_constante(cle: &str) -> Result<String, ErreurReglages> {
    if cle.trim().is_empty() {
        // definir() signale le nom vide
        return Ok(String::new());
    }
    match lire_latex(cle) {
        Ok(Expr::Var(nom)) => Ok(nom),
        _ => Err(ErreurReglages::NomConstante(cle.to_string())),
    }
}
