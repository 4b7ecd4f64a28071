// src/noyau/erreur.rs
//
// Taxonomie des erreurs du noyau.
// - Parse        : le texte LaTeX ne se traduit pas en arbre
// - Evaluation   : symboles libres restants / résultat non numérique
// - SansSolution : ensemble de solutions vide
// - Format       : valeur non finie passée au formateur (défense seulement)

use thiserror::Error;

/// Erreur du formateur numérique.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ErreurFormat {
    #[error("non-finite value cannot be formatted: {0}")]
    NonFini(f64),
}

/// Erreur d’une invocation (un mode, une commande).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErreurEval {
    #[error("could not parse expression: {0}")]
    Parse(String),

    #[error("could not evaluate expression: {0}")]
    Evaluation(String),

    #[error("Could not solve for {0}.")]
    SansSolution(String),

    #[error(transparent)]
    Format(#[from] ErreurFormat),
}

impl ErreurEval {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        ErreurEval::Parse(msg.into())
    }

    pub(crate) fn evaluation(msg: impl Into<String>) -> Self {
        ErreurEval::Evaluation(msg.into())
    }
}

/// Refus à la construction de la table des constantes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErreurConstante {
    #[error("constant name must not be empty")]
    NomVide,

    #[error("constant `{nom}` would depend on table entry `{symbole}`")]
    Cycle { nom: String, symbole: String },
}
