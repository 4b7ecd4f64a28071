// src/noyau/moteur.rs
//
// Les deux collaborateurs de l’évaluateur :
// - Traducteur    : balisage LaTeX -> Expr
// - MoteurAlgebre : substitution, simplification, repli numérique, résolution,
//                   dérivation, rendu
//
// L’évaluateur ne connaît que ces traits : les tests le branchent sur des moteurs factices.

use tracing::debug;

use super::canon::canon_expr;
use super::derivee::deriver;
use super::erreur::ErreurEval;
use super::expr::Expr;
use super::numerique::evaluer;
use super::rendu::{rendu, Style};
use super::rpn::lire_latex;
use super::solveur;

/// gauche = droite
#[derive(Clone, Debug, PartialEq)]
pub struct Egalite {
    pub gauche: Expr,
    pub droite: Expr,
}

impl Egalite {
    pub fn new(gauche: Expr, droite: Expr) -> Self {
        Self { gauche, droite }
    }
}

pub trait Traducteur {
    fn traduire(&self, balisage: &str) -> Result<Expr, ErreurEval>;
}

pub trait MoteurAlgebre {
    fn substituer(&self, e: &Expr, nom: &str, valeur: &Expr) -> Expr {
        e.substitue(nom, valeur)
    }

    fn simplifier(&self, e: &Expr) -> Expr;

    fn evaluer_numerique(&self, e: &Expr) -> Result<f64, ErreurEval>;

    /// Solutions dans l’ordre du moteur (pas une racine canonique).
    fn resoudre(&self, egalite: &Egalite, var: &str) -> Vec<Expr>;

    fn deriver(&self, e: &Expr, var: &str) -> Expr;

    fn rendu_balisage(&self, e: &Expr) -> String;

    fn rendu_texte(&self, e: &Expr) -> String;

    /// Pré-déclaration de symboles ; sans effet sur les résultats.
    fn declarer_symboles(&self, _noms: &[String]) {}
}

/* ------------------------ implémentations par défaut ------------------------ */

#[derive(Clone, Copy, Debug, Default)]
pub struct TraducteurLatex;

impl Traducteur for TraducteurLatex {
    fn traduire(&self, balisage: &str) -> Result<Expr, ErreurEval> {
        let s = balisage.trim();
        if s.is_empty() {
            return Err(ErreurEval::parse("entrée vide"));
        }
        lire_latex(s).map_err(ErreurEval::Parse)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MoteurExact;

impl MoteurAlgebre for MoteurExact {
    fn simplifier(&self, e: &Expr) -> Expr {
        canon_expr(e.clone())
    }

    fn evaluer_numerique(&self, e: &Expr) -> Result<f64, ErreurEval> {
        evaluer(e)
    }

    fn resoudre(&self, egalite: &Egalite, var: &str) -> Vec<Expr> {
        solveur::resoudre(&egalite.gauche, &egalite.droite, var)
    }

    fn deriver(&self, e: &Expr, var: &str) -> Expr {
        deriver(e, var)
    }

    fn rendu_balisage(&self, e: &Expr) -> String {
        rendu(e, Style::Latex)
    }

    fn rendu_texte(&self, e: &Expr) -> String {
        rendu(e, Style::Texte)
    }

    fn declarer_symboles(&self, noms: &[String]) {
        debug!(?noms, "symboles déclarés");
    }
}
