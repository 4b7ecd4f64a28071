// src/noyau/expr.rs
//
// Arbre d’expression (exact, sans flottants).
// - Rat   : rationnel exact
// - Const : constante mathématique nommée (π, e, i, φ, γ)
// - Var   : symbole libre (ex: x, alpha, x_1)
//
// IMPORTANT:
// - La substitution est pure : l’arbre d’entrée n’est jamais modifié, on en rend un nouveau.
// - Le traducteur ne produit que des Var ; les Const arrivent par la passe d’alias.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use std::collections::BTreeSet;
use std::fmt;

use super::rendu::{rendu, Style};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constante {
    Pi,
    E,
    I,
    Phi,
    Gamma,
}

impl Constante {
    /// Valeur réelle ; None pour l’unité imaginaire.
    pub fn valeur(self) -> Option<f64> {
        match self {
            Constante::Pi => Some(std::f64::consts::PI),
            Constante::E => Some(std::f64::consts::E),
            Constante::Phi => Some(1.618_033_988_749_895),
            Constante::Gamma => Some(0.577_215_664_901_532_9),
            Constante::I => None,
        }
    }

    pub fn latex(self) -> &'static str {
        match self {
            Constante::Pi => "\\pi",
            Constante::E => "e",
            Constante::I => "i",
            Constante::Phi => "\\phi",
            Constante::Gamma => "\\gamma",
        }
    }

    pub fn texte(self) -> &'static str {
        match self {
            Constante::Pi => "pi",
            Constante::E => "E",
            Constante::I => "I",
            Constante::Phi => "phi",
            Constante::Gamma => "gamma",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Rat(BigRational),
    Const(Constante),
    Var(String),

    Sqrt(Box<Expr>),           // √(x)
    Pow(Box<Expr>, Box<Expr>), // x^y

    Sin(Box<Expr>),
    Cos(Box<Expr>),
    Tan(Box<Expr>),
    Ln(Box<Expr>),

    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
}

/* ------------------------ Constructeurs ------------------------ */

impl Expr {
    pub fn entier(n: i64) -> Expr {
        Expr::Rat(BigRational::from_integer(BigInt::from(n)))
    }

    pub fn rat(n: i64, d: i64) -> Expr {
        Expr::Rat(BigRational::new(BigInt::from(n), BigInt::from(d)))
    }

    pub fn zero() -> Expr {
        Expr::Rat(BigRational::zero())
    }

    pub fn un() -> Expr {
        Expr::Rat(BigRational::one())
    }

    pub fn var(nom: &str) -> Expr {
        Expr::Var(nom.to_string())
    }

    pub fn add(a: Expr, b: Expr) -> Expr {
        Expr::Add(Box::new(a), Box::new(b))
    }

    pub fn sub(a: Expr, b: Expr) -> Expr {
        Expr::Sub(Box::new(a), Box::new(b))
    }

    pub fn mul(a: Expr, b: Expr) -> Expr {
        Expr::Mul(Box::new(a), Box::new(b))
    }

    pub fn div(a: Expr, b: Expr) -> Expr {
        Expr::Div(Box::new(a), Box::new(b))
    }

    pub fn pow(a: Expr, b: Expr) -> Expr {
        Expr::Pow(Box::new(a), Box::new(b))
    }

    /// -a, sous la forme canonique (-1)·a.
    pub fn neg(a: Expr) -> Expr {
        match a {
            Expr::Rat(r) => Expr::Rat(-r),
            other => Expr::mul(Expr::entier(-1), other),
        }
    }

    /// e^a
    pub fn exp(a: Expr) -> Expr {
        Expr::pow(Expr::Const(Constante::E), a)
    }
}

/* ------------------------ Requêtes ------------------------ */

impl Expr {
    pub fn as_rat(&self) -> Option<&BigRational> {
        match self {
            Expr::Rat(r) => Some(r),
            _ => None,
        }
    }

    pub fn est_zero(&self) -> bool {
        matches!(self, Expr::Rat(r) if r.is_zero())
    }

    pub fn est_un(&self) -> bool {
        matches!(self, Expr::Rat(r) if r.is_one())
    }

    pub fn est_negatif(&self) -> bool {
        matches!(self, Expr::Rat(r) if r.is_negative())
    }

    /// Enfants directs (ordre gauche → droite).
    pub fn enfants(&self) -> Vec<&Expr> {
        use Expr::*;
        match self {
            Rat(_) | Const(_) | Var(_) => Vec::new(),
            Sqrt(x) | Sin(x) | Cos(x) | Tan(x) | Ln(x) => vec![x.as_ref()],
            Pow(a, b) | Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) => {
                vec![a.as_ref(), b.as_ref()]
            }
        }
    }

    /// Reconstruit le noeud en appliquant `f` à chaque enfant.
    pub fn map_enfants(self, mut f: impl FnMut(Expr) -> Expr) -> Expr {
        use Expr::*;
        match self {
            Rat(_) | Const(_) | Var(_) => self,
            Sqrt(x) => Sqrt(Box::new(f(*x))),
            Sin(x) => Sin(Box::new(f(*x))),
            Cos(x) => Cos(Box::new(f(*x))),
            Tan(x) => Tan(Box::new(f(*x))),
            Ln(x) => Ln(Box::new(f(*x))),
            Pow(a, b) => Pow(Box::new(f(*a)), Box::new(f(*b))),
            Add(a, b) => Add(Box::new(f(*a)), Box::new(f(*b))),
            Sub(a, b) => Sub(Box::new(f(*a)), Box::new(f(*b))),
            Mul(a, b) => Mul(Box::new(f(*a)), Box::new(f(*b))),
            Div(a, b) => Div(Box::new(f(*a)), Box::new(f(*b))),
        }
    }

    /// Symboles libres, triés.
    pub fn symboles_libres(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut pile: Vec<&Expr> = Vec::with_capacity(32);
        pile.push(self);

        while let Some(e) = pile.pop() {
            match e {
                Expr::Var(s) => {
                    out.insert(s.clone());
                }
                autre => pile.extend(autre.enfants()),
            }
        }
        out
    }

    /// Nombre d’occurrences de `nom` dans l’arbre.
    pub fn occurrences(&self, nom: &str) -> usize {
        let mut n = 0;
        let mut pile: Vec<&Expr> = vec![self];
        while let Some(e) = pile.pop() {
            match e {
                Expr::Var(s) if s == nom => n += 1,
                autre => pile.extend(autre.enfants()),
            }
        }
        n
    }

    pub fn contient_var(&self, nom: &str) -> bool {
        self.occurrences(nom) > 0
    }

    pub fn contient_const(&self, c: Constante) -> bool {
        let mut pile: Vec<&Expr> = vec![self];
        while let Some(e) = pile.pop() {
            match e {
                Expr::Const(k) if *k == c => return true,
                autre => pile.extend(autre.enfants()),
            }
        }
        false
    }
}

/* ------------------------ Substitution (pure) ------------------------ */

impl Expr {
    /// Remplace chaque Var(nom) par `valeur`.
    pub fn substitue(&self, nom: &str, valeur: &Expr) -> Expr {
        self.substitue_avec(&|s| (s == nom).then(|| valeur.clone()))
    }

    /// Substitution simultanée : `table(s)` donne la valeur de Var(s), ou None pour laisser tel quel.
    /// Les valeurs insérées ne sont pas re-parcourues.
    pub fn substitue_avec(&self, table: &dyn Fn(&str) -> Option<Expr>) -> Expr {
        match self {
            Expr::Var(s) => table(s).unwrap_or_else(|| self.clone()),
            autre => autre.clone().map_enfants(|x| x.substitue_avec(table)),
        }
    }
}

/* ------------------------ Outils rationnels (utilisés par canon) ------------------------ */

pub(crate) fn rational_pow_int(base: &BigRational, exp: i64) -> Option<BigRational> {
    if exp == 0 {
        return Some(BigRational::one());
    }
    if exp < 0 {
        if base.is_zero() {
            return None;
        }
        let pos = rational_pow_int(base, -exp)?;
        return Some(BigRational::one() / pos);
    }

    let mut e = exp as u64;
    let mut acc = BigRational::one();
    let mut b = base.clone();

    while e > 0 {
        if (e & 1) == 1 {
            acc *= b.clone();
        }
        e >>= 1;
        if e > 0 {
            b *= b.clone();
        }
    }
    Some(acc)
}

pub(crate) fn rational_sqrt_exact(r: &BigRational) -> Option<BigRational> {
    if r.is_negative() {
        return None;
    }
    let sn = int_sqrt_exact(r.numer())?;
    let sd = int_sqrt_exact(r.denom())?;
    Some(BigRational::new(sn, sd))
}

fn int_sqrt_exact(x: &BigInt) -> Option<BigInt> {
    if x.is_negative() {
        return None;
    }
    let s = x.sqrt();
    if &s * &s == *x {
        Some(s)
    } else {
        None
    }
}

/// Décompose n >= 1 en n = s^2 * t, avec t sans facteur carré (essais jusqu’à √n).
pub(crate) fn extrait_carre_parfait(n: &BigInt) -> (BigInt, BigInt) {
    if n.is_zero() {
        return (BigInt::zero(), BigInt::zero());
    }
    if n.is_one() {
        return (BigInt::one(), BigInt::one());
    }

    let mut reste = n.clone();
    let mut s = BigInt::one();

    let mut p = BigInt::from(2);
    while &p * &p <= reste {
        let p2 = &p * &p;

        while (&reste % &p2).is_zero() {
            reste /= &p2;
            s *= &p;
        }

        if p == BigInt::from(2) {
            p = BigInt::from(3);
        } else {
            p += 2;
        }
    }

    (s, reste)
}

/* ------------------------ Affichage texte brut ------------------------ */

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&rendu(self, Style::Texte))
    }
}
