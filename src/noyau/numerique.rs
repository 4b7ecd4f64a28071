// src/noyau/numerique.rs
//
// Évaluation flottante d’un arbre (après canonicalisation).
// Refus (ErreurEval::Evaluation) :
// - symbole libre restant
// - unité imaginaire
// - division par zéro, résultat intermédiaire non fini ou complexe (√ d’un négatif, ln ≤ 0…)

use num_traits::ToPrimitive;
use tracing::trace;

use super::canon::canon_expr;
use super::erreur::ErreurEval;
use super::expr::{Constante, Expr};

/// Simplifie puis replie en f64.
pub fn evaluer(e: &Expr) -> Result<f64, ErreurEval> {
    let c = canon_expr(e.clone());

    let libres = c.symboles_libres();
    if !libres.is_empty() {
        let noms: Vec<&str> = libres.iter().map(String::as_str).collect();
        return Err(ErreurEval::evaluation(format!(
            "symboles non résolus: {}",
            noms.join(", ")
        )));
    }
    if c.contient_const(Constante::I) {
        return Err(ErreurEval::evaluation("résultat complexe"));
    }

    let v = replier(&c)?;
    trace!(valeur = v, "repli numérique");
    Ok(v)
}

fn fini(v: f64, quoi: &str) -> Result<f64, ErreurEval> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ErreurEval::evaluation(format!("{quoi}: valeur non finie")))
    }
}

fn replier(e: &Expr) -> Result<f64, ErreurEval> {
    use Expr::*;

    match e {
        Rat(r) => fini(r.to_f64().unwrap_or(f64::NAN), "rationnel"),
        Const(c) => c
            .valeur()
            .ok_or_else(|| ErreurEval::evaluation("résultat complexe")),
        Var(s) => Err(ErreurEval::evaluation(format!("symboles non résolus: {s}"))),

        Add(a, b) => fini(replier(a)? + replier(b)?, "somme"),
        Sub(a, b) => fini(replier(a)? - replier(b)?, "différence"),
        Mul(a, b) => fini(replier(a)? * replier(b)?, "produit"),
        Div(a, b) => {
            let d = replier(b)?;
            if d == 0.0 {
                return Err(ErreurEval::evaluation("division par zéro"));
            }
            fini(replier(a)? / d, "quotient")
        }

        Pow(a, b) => {
            let x = replier(a)?;
            let y = replier(b)?;
            if x == 0.0 && y < 0.0 {
                return Err(ErreurEval::evaluation("division par zéro"));
            }
            if x < 0.0 && y.fract() != 0.0 {
                return Err(ErreurEval::evaluation("résultat complexe"));
            }
            fini(x.powf(y), "puissance")
        }
        Sqrt(a) => {
            let x = replier(a)?;
            if x < 0.0 {
                return Err(ErreurEval::evaluation("résultat complexe"));
            }
            fini(x.sqrt(), "racine")
        }

        Sin(a) => fini(replier(a)?.sin(), "sin"),
        Cos(a) => fini(replier(a)?.cos(), "cos"),
        Tan(a) => fini(replier(a)?.tan(), "tan"),
        Ln(a) => {
            let x = replier(a)?;
            if x <= 0.0 {
                return Err(ErreurEval::evaluation("logarithme hors domaine"));
            }
            fini(x.ln(), "ln")
        }
    }
}
