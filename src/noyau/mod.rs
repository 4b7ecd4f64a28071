//! Noyau de l’évaluateur
//!
//! Organisation interne :
//! - erreur.rs     : taxonomie des erreurs (Parse, Evaluation, SansSolution, Format)
//! - expr.rs       : arbre exact + substitution pure
//! - jetons.rs     : tokenisation LaTeX
//! - rpn.rs        : normalisation + shunting-yard + construction Expr
//! - canon.rs      : forme canonique (simplification)
//! - derivee.rs    : dérivation symbolique
//! - solveur.rs    : résolution d’équations
//! - numerique.rs  : repli flottant
//! - rendu.rs      : rendu LaTeX / texte brut
//! - constantes.rs : table des constantes + alias
//! - moteur.rs     : traits Traducteur / MoteurAlgebre + implémentations
//! - format.rs     : formateur des résultats numériques
//! - eval.rs       : aiguillage des modes

pub mod canon;
pub mod constantes;
pub mod derivee;
pub mod erreur;
pub mod eval;
pub mod expr;
pub mod format;
pub mod jetons;
pub mod moteur;
pub mod numerique;
pub mod rendu;
pub mod rpn;
pub mod solveur;

#[cfg(test)]
mod tests_scientifiques;

#[cfg(test)]
mod tests_fuzz_safe;

// API publique
pub use constantes::TableConstantes;
pub use erreur::{ErreurConstante, ErreurEval, ErreurFormat};
pub use eval::{Commande, ConfigEvaluateur, Evaluateur, Mode, Sortie, DECIMALES_PAR_DEFAUT};
pub use expr::{Constante, Expr};
pub use format::{formater, ResultatFormate};
pub use moteur::{Egalite, MoteurAlgebre, MoteurExact, Traducteur, TraducteurLatex};
