//! Évaluateur d’expressions LaTeX : valeur numérique, forme simplifiée,
//! résolution d’équation, dérivée.

pub mod config;
pub mod noyau;
