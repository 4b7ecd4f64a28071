// src/noyau/solveur.rs
//
// Résolution de gauche = droite pour une variable, sur f = canon(gauche - droite) :
// 1) f polynôme en v de degré 1 ou 2 (coefficients sans v) : formule exacte
// 2) sinon, si v n’apparaît qu’une fois : isolation pas à pas (+ - · / ^ √ ln e^)
//    puis vérification numérique du candidat
// 3) sinon : aucune solution rendue
//
// Ordre des racines d’un trinôme : croissant si les deux sont réelles numériques,
// sinon la racine « moins » d’abord. Racine double rendue une seule fois.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive};
use tracing::debug;

use super::canon::{canon_expr, decompose_terme};
use super::expr::{Constante, Expr};
use super::numerique::evaluer;

/// Tolérance de la vérification par substitution.
const TOLERANCE_VERIF: f64 = 1e-9;

/// Borne des exposants essayés pour a^k = c (a, c rationnels).
const MAX_LOG_EXACT: i64 = 64;

pub fn resoudre(gauche: &Expr, droite: &Expr, var: &str) -> Vec<Expr> {
    let f = canon_expr(Expr::sub(gauche.clone(), droite.clone()));
    debug!(equation = %f, var, "résolution de f = 0");

    if !f.contient_var(var) {
        return Vec::new();
    }

    if let Some(coeffs) = coefficients(&f, var) {
        match coeffs.len() {
            2 => return vec![lineaire(&coeffs[0], &coeffs[1])],
            3 => return trinome(&coeffs[0], &coeffs[1], &coeffs[2]),
            _ => {}
        }
    }

    if f.occurrences(var) == 1 {
        if let Some(candidat) = isoler(&f, var) {
            if verifie(&f, var, &candidat) {
                return vec![candidat];
            }
            debug!(candidat = %candidat, "candidat rejeté par substitution");
        }
    }

    Vec::new()
}

/* ------------------------ polynômes ------------------------ */

/// Coefficients [c0, c1, …, cn] de f en v (cn non nul), ou None si f n’est pas polynomiale.
fn coefficients(f: &Expr, v: &str) -> Option<Vec<Expr>> {
    let mut termes = Vec::new();
    let mut pile = vec![f.clone()];
    while let Some(t) = pile.pop() {
        match t {
            Expr::Add(a, b) => {
                pile.push(*b);
                pile.push(*a);
            }
            autre => termes.push(autre),
        }
    }

    let mut par_degre: Vec<Vec<Expr>> = Vec::new();
    for t in termes {
        let (c, facteurs) = decompose_terme(t);
        let mut degre: usize = 0;
        let mut reste = vec![Expr::Rat(c)];

        for fac in facteurs {
            match &fac {
                Expr::Var(s) if s == v => degre += 1,
                Expr::Pow(b, n) if matches!(b.as_ref(), Expr::Var(s) if s == v) => {
                    let n = n.as_rat()?;
                    if !n.is_integer() || !n.is_positive() {
                        return None;
                    }
                    degre += n.to_integer().to_usize()?;
                }
                autre if autre.contient_var(v) => return None,
                _ => reste.push(fac),
            }
        }

        if par_degre.len() <= degre {
            par_degre.resize_with(degre + 1, Vec::new);
        }
        par_degre[degre].push(produit(reste));
    }

    let mut coeffs: Vec<Expr> = par_degre
        .into_iter()
        .map(|ts| canon_expr(somme(ts)))
        .collect();
    while coeffs.last().is_some_and(Expr::est_zero) {
        coeffs.pop();
    }
    Some(coeffs)
}

fn somme(termes: Vec<Expr>) -> Expr {
    termes
        .into_iter()
        .reduce(Expr::add)
        .unwrap_or_else(Expr::zero)
}

fn produit(facteurs: Vec<Expr>) -> Expr {
    facteurs
        .into_iter()
        .reduce(Expr::mul)
        .unwrap_or_else(Expr::un)
}

/// c1·v + c0 = 0
fn lineaire(c0: &Expr, c1: &Expr) -> Expr {
    canon_expr(Expr::div(Expr::neg(c0.clone()), c1.clone()))
}

/// a·v² + b·v + c = 0
fn trinome(c: &Expr, b: &Expr, a: &Expr) -> Vec<Expr> {
    let delta = canon_expr(Expr::sub(
        Expr::pow(b.clone(), Expr::entier(2)),
        Expr::mul(Expr::mul(Expr::entier(4), a.clone()), c.clone()),
    ));
    let racine = |signe: i64| {
        canon_expr(Expr::div(
            Expr::add(
                Expr::neg(b.clone()),
                Expr::mul(Expr::entier(signe), Expr::pow(delta.clone(), Expr::rat(1, 2))),
            ),
            Expr::mul(Expr::entier(2), a.clone()),
        ))
    };

    if delta.est_zero() {
        return vec![racine(1)];
    }

    let moins = racine(-1);
    let plus = racine(1);
    match (evaluer(&moins), evaluer(&plus)) {
        (Ok(x1), Ok(x2)) if x2 < x1 => vec![plus, moins],
        _ => vec![moins, plus],
    }
}

/* ------------------------ isolation ------------------------ */

/// Inverse f(v) = 0 quand v n’apparaît qu’une fois dans f.
fn isoler(f: &Expr, v: &str) -> Option<Expr> {
    let mut courant = f.clone();
    let mut cible = Expr::zero();

    loop {
        courant = match courant {
            Expr::Var(ref s) if s == v => return Some(canon_expr(cible)),

            Expr::Add(a, b) => {
                let (avec, sans) = separer(*a, *b, v);
                cible = Expr::sub(cible, sans);
                avec
            }
            Expr::Sub(a, b) => {
                if a.contient_var(v) {
                    cible = Expr::add(cible, *b);
                    *a
                } else {
                    cible = Expr::sub(*a, cible);
                    *b
                }
            }
            Expr::Mul(a, b) => {
                let (avec, sans) = separer(*a, *b, v);
                if canon_expr(sans.clone()).est_zero() {
                    return None;
                }
                cible = Expr::div(cible, sans);
                avec
            }
            Expr::Div(a, b) => {
                if a.contient_var(v) {
                    cible = Expr::mul(cible, *b);
                    *a
                } else {
                    cible = Expr::div(*a, cible);
                    *b
                }
            }

            Expr::Pow(a, b) => {
                if a.contient_var(v) {
                    // a^n = c  =>  a = c^(1/n) (racine principale)
                    cible = Expr::pow(cible, Expr::div(Expr::un(), *b));
                    *a
                } else {
                    // a^g = c  =>  g = ln(c)/ln(a)
                    cible = logarithme(&a, cible);
                    *b
                }
            }
            Expr::Sqrt(a) => {
                cible = Expr::pow(cible, Expr::entier(2));
                *a
            }
            Expr::Ln(a) => {
                cible = Expr::exp(cible);
                *a
            }

            _ => return None,
        };
    }
}

fn separer(a: Expr, b: Expr, v: &str) -> (Expr, Expr) {
    if a.contient_var(v) {
        (a, b)
    } else {
        (b, a)
    }
}

/// log_a(c), exact quand a et c sont rationnels et c = a^k.
fn logarithme(base: &Expr, cible: Expr) -> Expr {
    let cible = canon_expr(cible);
    if let (Expr::Rat(a), Expr::Rat(c)) = (base, &cible) {
        if let Some(k) = log_exact(a, c) {
            return Expr::Rat(BigRational::from_integer(BigInt::from(k)));
        }
    }
    match base {
        Expr::Const(Constante::E) => Expr::Ln(Box::new(cible)),
        autre => Expr::div(Expr::Ln(Box::new(cible)), Expr::Ln(Box::new(autre.clone()))),
    }
}

fn log_exact(a: &BigRational, c: &BigRational) -> Option<i64> {
    if !a.is_positive() || a.is_one() || !c.is_positive() {
        return None;
    }
    if c.is_one() {
        return Some(0);
    }
    // le sens de a^k vers c se lit sur (a > 1) == (c > 1)
    let pas: i64 = if (a > &BigRational::one()) == (c > &BigRational::one()) { 1 } else { -1 };
    let mut acc = BigRational::one();
    for k in 1..=MAX_LOG_EXACT {
        acc = if pas > 0 { acc * a } else { acc / a };
        if acc == *c {
            return Some(pas * k);
        }
    }
    None
}

/// Garde le candidat sauf si la substitution prouve numériquement qu’il est faux.
fn verifie(f: &Expr, v: &str, candidat: &Expr) -> bool {
    match evaluer(&f.substitue(v, candidat)) {
        Ok(r) => r.abs() <= TOLERANCE_VERIF * r.abs().max(1.0),
        // symbolique ou complexe : rien ne prouve qu’il est faux
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::rendu::{rendu, Style};
    use crate::noyau::rpn::lire_latex;

    fn sol(g: &str, d: &str) -> Vec<String> {
        let g = lire_latex(g).unwrap();
        let d = lire_latex(d).unwrap();
        resoudre(&g, &d, "x")
            .iter()
            .map(|e| rendu(e, Style::Latex))
            .collect()
    }

    #[test]
    fn premier_degre() {
        assert_eq!(sol("x + 2", "5"), vec!["3"]);
        assert_eq!(sol("3x", "1"), vec!["\\frac{1}{3}"]);
        assert_eq!(sol("2x - 1", "x + 4"), vec!["5"]);
    }

    #[test]
    fn coefficient_symbolique() {
        assert_eq!(sol("a x", "b"), vec!["\\frac{b}{a}"]);
    }

    #[test]
    fn second_degre() {
        assert_eq!(sol("x^2 - 5x + 6", "0"), vec!["2", "3"]);
        assert_eq!(sol("x^2", "2"), vec!["-\\sqrt{2}", "\\sqrt{2}"]);
        assert_eq!(sol("x^2 - 2x + 1", "0"), vec!["1"]);
    }

    #[test]
    fn racines_complexes() {
        assert_eq!(sol("x^2", "-4"), vec!["-2 i", "2 i"]);
    }

    #[test]
    fn isolation() {
        assert_eq!(sol("x^3", "8"), vec!["2"]);
        assert_eq!(sol("\\sqrt{x}", "3"), vec!["9"]);
        assert_eq!(sol("2^{x}", "8"), vec!["3"]);
        assert_eq!(sol("\\frac{1}{x}", "4"), vec!["\\frac{1}{4}"]);
    }

    #[test]
    fn rejet_par_verification() {
        assert!(sol("\\sqrt{x}", "-2").is_empty());
    }

    #[test]
    fn sans_solution() {
        assert!(sol("x", "x").is_empty());
        assert!(sol("2", "3").is_empty());
        assert!(sol("\\sin(x) + x", "1").is_empty());
    }
}
