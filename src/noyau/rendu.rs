// src/noyau/rendu.rs
//
// Rendu d’une Expr en texte.
// - Style::Latex : balisage (\frac{}{}, x^{2}, \sqrt{}, \pi, \sin\left(x\right))
// - Style::Texte : texte brut (2*x, x^2, sqrt(x), exp(x), (x + 1)/x^2)
//
// Les puissances négatives passent au dénominateur ; le signe d’un terme
// de somme est sorti (a + (-2)·x => a - 2x).

use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use super::expr::{Constante, Expr};
use super::jetons::est_grec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    Latex,
    Texte,
}

/// Niveau de liaison du texte produit (plus haut = plus “atomique”).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Niveau {
    Somme,
    Produit,
    Puissance,
    Atome,
}

pub fn rendu(e: &Expr, style: Style) -> String {
    rendre(e, style).0
}

fn rendre(e: &Expr, style: Style) -> (String, Niveau) {
    use Expr::*;

    match e {
        Rat(r) => rendre_rat(r, style),
        Const(c) => (
            match style {
                Style::Latex => c.latex().to_string(),
                Style::Texte => c.texte().to_string(),
            },
            Niveau::Atome,
        ),
        Var(s) => (nom_var(s, style), Niveau::Atome),

        Add(_, _) | Sub(_, _) => (rendre_somme(e, style), Niveau::Somme),
        Mul(_, _) | Div(_, _) => rendre_produit(e, style),

        Pow(_, x) if x.est_negatif() => rendre_produit(e, style),
        Pow(b, x) => rendre_puissance(b, x, style),

        Sqrt(x) => (racine(x, style), Niveau::Atome),
        Sin(x) => (fonction("sin", x, style), Niveau::Atome),
        Cos(x) => (fonction("cos", x, style), Niveau::Atome),
        Tan(x) => (fonction("tan", x, style), Niveau::Atome),
        Ln(x) => (fonction("ln", x, style), Niveau::Atome),
    }
}

fn parens(s: &str, style: Style) -> String {
    match style {
        Style::Latex => format!("\\left({s}\\right)"),
        Style::Texte => format!("({s})"),
    }
}

/// Rend `e`, entre parenthèses si son niveau est sous `min`.
fn envelopper(e: &Expr, min: Niveau, style: Style) -> String {
    let (s, n) = rendre(e, style);
    if n < min {
        parens(&s, style)
    } else {
        s
    }
}

/* ------------------------ feuilles ------------------------ */

fn rendre_rat(r: &BigRational, style: Style) -> (String, Niveau) {
    let n = r.numer();
    let d = r.denom();
    if d.is_one() {
        let niveau = if n.is_negative() { Niveau::Produit } else { Niveau::Atome };
        return (n.to_string(), niveau);
    }

    let s = match style {
        Style::Latex => {
            let signe = if n.is_negative() { "-" } else { "" };
            format!("{signe}\\frac{{{}}}{{{d}}}", n.abs())
        }
        Style::Texte => format!("{n}/{d}"),
    };
    (s, Niveau::Produit)
}

fn nom_var(nom: &str, style: Style) -> String {
    if style == Style::Texte {
        return nom.to_string();
    }
    let (base, indice) = match nom.split_once('_') {
        Some((b, i)) => (b, Some(i)),
        None => (nom, None),
    };
    let base = if est_grec(base) {
        format!("\\{base}")
    } else {
        base.to_string()
    };
    match indice {
        Some(i) => format!("{base}_{{{i}}}"),
        None => base,
    }
}

fn racine(x: &Expr, style: Style) -> String {
    match style {
        Style::Latex => format!("\\sqrt{{{}}}", rendu(x, style)),
        Style::Texte => format!("sqrt({})", rendu(x, style)),
    }
}

fn fonction(nom: &str, x: &Expr, style: Style) -> String {
    match style {
        Style::Latex => format!("\\{nom}{}", parens(&rendu(x, style), style)),
        Style::Texte => format!("{nom}({})", rendu(x, style)),
    }
}

/* ------------------------ somme ------------------------ */

fn collect_termes<'a>(e: &'a Expr, moins: bool, out: &mut Vec<(bool, &'a Expr)>) {
    match e {
        Expr::Add(a, b) => {
            collect_termes(a, moins, out);
            collect_termes(b, moins, out);
        }
        Expr::Sub(a, b) => {
            collect_termes(a, moins, out);
            out.push((!moins, b.as_ref()));
        }
        autre => out.push((moins, autre)),
    }
}

/// Si `e` s’affiche avec un signe moins en tête, renvoie sa valeur absolue.
fn extraire_signe(e: &Expr) -> Option<Expr> {
    match e {
        Expr::Rat(r) if r.is_negative() => Some(Expr::Rat(-r)),
        Expr::Mul(a, b) => {
            let abs_a = extraire_signe(a)?;
            Some(if abs_a.est_un() {
                (**b).clone()
            } else {
                Expr::mul(abs_a, (**b).clone())
            })
        }
        Expr::Div(a, b) => Some(Expr::div(extraire_signe(a)?, (**b).clone())),
        _ => None,
    }
}

fn rendre_somme(e: &Expr, style: Style) -> String {
    let mut termes = Vec::new();
    collect_termes(e, false, &mut termes);

    let mut out = String::new();
    for (k, (moins, t)) in termes.into_iter().enumerate() {
        let (negatif, abs) = match extraire_signe(t) {
            Some(a) => (!moins, a),
            None => (moins, t.clone()),
        };
        // un terme retranché qui est lui-même une somme garde ses parenthèses
        let corps = envelopper(&abs, Niveau::Produit, style);

        match (k, negatif) {
            (0, false) => out.push_str(&corps),
            (0, true) => {
                out.push('-');
                out.push_str(&corps);
            }
            (_, false) => {
                out.push_str(" + ");
                out.push_str(&corps);
            }
            (_, true) => {
                out.push_str(" - ");
                out.push_str(&corps);
            }
        }
    }
    out
}

/* ------------------------ produit ------------------------ */

fn collecter<'a>(
    e: &'a Expr,
    inverse: bool,
    coeff: &mut BigRational,
    num: &mut Vec<Expr>,
    den: &mut Vec<Expr>,
) {
    match e {
        Expr::Mul(a, b) => {
            collecter(a, inverse, coeff, num, den);
            collecter(b, inverse, coeff, num, den);
        }
        Expr::Div(a, b) => {
            collecter(a, inverse, coeff, num, den);
            collecter(b, !inverse, coeff, num, den);
        }
        Expr::Rat(r) if !(inverse && r.is_zero()) => {
            if inverse {
                *coeff /= r;
            } else {
                *coeff *= r;
            }
        }
        Expr::Pow(b, x) if x.est_negatif() => {
            let oppose = match x.as_ref() {
                Expr::Rat(r) => -r,
                _ => BigRational::zero(),
            };
            let f = if oppose.is_one() {
                (**b).clone()
            } else {
                Expr::pow((**b).clone(), Expr::Rat(oppose))
            };
            if inverse {
                num.push(f);
            } else {
                den.push(f);
            }
        }
        autre => {
            if inverse {
                den.push(autre.clone());
            } else {
                num.push(autre.clone());
            }
        }
    }
}

fn joindre(parts: &[String], style: Style) -> String {
    let mut out = String::new();
    for (k, p) in parts.iter().enumerate() {
        if k > 0 {
            match style {
                Style::Texte => out.push('*'),
                Style::Latex => {
                    if p.starts_with(|c: char| c.is_ascii_digit()) {
                        out.push_str(" \\cdot ");
                    } else {
                        out.push(' ');
                    }
                }
            }
        }
        out.push_str(p);
    }
    out
}

/// Parties d’un côté de fraction : coefficient entier puis facteurs.
/// Dans un \frac, un facteur seul n’a pas besoin de parenthèses.
fn cote(
    coef: &num_bigint::BigInt,
    facteurs: &[Expr],
    dans_frac: bool,
    style: Style,
) -> Vec<String> {
    let mut parts = Vec::with_capacity(facteurs.len() + 1);
    if !coef.is_one() {
        parts.push(coef.to_string());
    }
    if dans_frac && style == Style::Latex && parts.is_empty() && facteurs.len() == 1 {
        parts.push(rendu(&facteurs[0], style));
        return parts;
    }
    for f in facteurs {
        parts.push(envelopper(f, Niveau::Puissance, style));
    }
    parts
}

fn rendre_produit(e: &Expr, style: Style) -> (String, Niveau) {
    let mut coeff = BigRational::one();
    let mut num = Vec::new();
    let mut den = Vec::new();
    collecter(e, false, &mut coeff, &mut num, &mut den);

    if coeff.is_zero() {
        return ("0".to_string(), Niveau::Atome);
    }

    let negatif = coeff.is_negative();
    let abs = coeff.abs();
    let signe = if negatif { "-" } else { "" };
    let a_den = !den.is_empty() || !abs.denom().is_one();

    let parts_num = cote(abs.numer(), &num, a_den, style);
    let numer = if parts_num.is_empty() {
        "1".to_string()
    } else {
        joindre(&parts_num, style)
    };

    if !a_den {
        // facteur seul, sans signe : on garde son niveau propre
        if !negatif && num.len() == 1 && abs.is_one() {
            return rendre(&num[0], style);
        }
        return (format!("{signe}{numer}"), Niveau::Produit);
    }

    let parts_den = cote(abs.denom(), &den, true, style);
    let denom = joindre(&parts_den, style);

    let s = match style {
        Style::Latex => format!("{signe}\\frac{{{numer}}}{{{denom}}}"),
        Style::Texte => {
            let denom = if parts_den.len() > 1 {
                parens(&denom, style)
            } else {
                denom
            };
            format!("{signe}{numer}/{denom}")
        }
    };
    (s, Niveau::Produit)
}

/* ------------------------ puissance ------------------------ */

fn rendre_puissance(b: &Expr, x: &Expr, style: Style) -> (String, Niveau) {
    if *x == Expr::rat(1, 2) {
        return (racine(b, style), Niveau::Atome);
    }

    if matches!(b, Expr::Const(Constante::E)) {
        return match style {
            Style::Latex => (format!("e^{{{}}}", rendu(x, style)), Niveau::Puissance),
            Style::Texte => (format!("exp({})", rendu(x, style)), Niveau::Atome),
        };
    }

    let base = envelopper(b, Niveau::Atome, style);
    match style {
        Style::Latex => (format!("{base}^{{{}}}", rendu(x, style)), Niveau::Puissance),
        Style::Texte => (
            format!("{base}^{}", envelopper(x, Niveau::Atome, style)),
            Niveau::Puissance,
        ),
    }
}
