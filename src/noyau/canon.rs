// src/noyau/canon.rs
//
// Canonicalisation forte (déterministe) :
// - aplatissement Add/Sub et Mul/Div
// - a - b  => a + (-1)·b ; a / b => a · b^-1 ; √a => a^(1/2)
// - regroupement des termes semblables (coefficients rationnels exacts)
// - regroupement des bases égales (somme des exposants)
// - puissances rationnelles exactes : √12 -> 2√3, 4^(1/2) -> 2, √(-4) -> 2i
// - tri déterministe des termes/facteurs (ordre total)
// - valeurs connues : sin/cos/tan de kπ/n (n ∈ {1,2,3,4,6}), ln 1, ln e, e^(ln a)
//
// Note : pas de développement des produits de sommes, sauf rationnel·somme.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::noyau::expr::{extrait_carre_parfait, rational_pow_int, Constante, Expr};

/// Garde-fou : au-delà, une puissance rationnelle reste symbolique.
const MAX_BITS_PUISSANCE: u64 = 65_536;

/// Profondeur max des re-passes de regroupement d’un produit.
const MAX_REPASSES: usize = 4;

pub fn canon_expr(e: Expr) -> Expr {
    use Expr::*;

    match e {
        Rat(_) | Const(_) | Var(_) => e,

        Sqrt(x) => canon_pow(canon_expr(*x), Expr::rat(1, 2)),
        Pow(a, b) => canon_pow(canon_expr(*a), canon_expr(*b)),

        Sin(x) => canon_trig(Trig::Sin, canon_expr(*x)),
        Cos(x) => canon_trig(Trig::Cos, canon_expr(*x)),
        Tan(x) => canon_trig(Trig::Tan, canon_expr(*x)),
        Ln(x) => canon_ln(canon_expr(*x)),

        Add(..) | Sub(..) => {
            let mut termes = Vec::new();
            collect_addsub(e, false, &mut termes);
            canon_somme(termes.into_iter().map(canon_expr).collect())
        }

        Mul(..) | Div(..) => {
            let mut facteurs = Vec::new();
            collect_muldiv(e, false, &mut facteurs);
            canon_produit(facteurs.into_iter().map(canon_expr).collect())
        }
    }
}

/* ------------------------ clef de tri déterministe ------------------------ */

fn rang(e: &Expr) -> u8 {
    use Expr::*;
    match e {
        Rat(_) => 0,
        Const(_) => 1,
        Var(_) => 2,
        Pow(_, _) | Sqrt(_) => 3,
        Sin(_) | Cos(_) | Tan(_) | Ln(_) => 4,
        Mul(_, _) | Div(_, _) => 5,
        Add(_, _) | Sub(_, _) => 6,
    }
}

pub(crate) fn key_string(e: &Expr) -> String {
    use Expr::*;
    match e {
        Rat(r) => format!("R{}/{}", r.numer(), r.denom()),
        Const(c) => format!("C{c:?}"),
        Var(s) => format!("V({s})"),

        Sqrt(x) => format!("SQRT({})", key_string(x)),
        Pow(a, b) => format!("POW({},{})", key_string(a), key_string(b)),

        Sin(x) => format!("SIN({})", key_string(x)),
        Cos(x) => format!("COS({})", key_string(x)),
        Tan(x) => format!("TAN({})", key_string(x)),
        Ln(x) => format!("LN({})", key_string(x)),

        Add(a, b) => format!("ADD({},{})", key_string(a), key_string(b)),
        Sub(a, b) => format!("SUB({},{})", key_string(a), key_string(b)),
        Mul(a, b) => format!("MUL({},{})", key_string(a), key_string(b)),
        Div(a, b) => format!("DIV({},{})", key_string(a), key_string(b)),
    }
}

/// Un facteur x^n se trie avec sa base (x^2 avant y).
fn cmp_facteur(a: &Expr, b: &Expr) -> Ordering {
    fn base(e: &Expr) -> &Expr {
        match e {
            Expr::Pow(b, _) => b,
            autre => autre,
        }
    }
    let (ba, bb) = (base(a), base(b));
    rang(ba)
        .cmp(&rang(bb))
        .then_with(|| key_string(ba).cmp(&key_string(bb)))
        .then_with(|| key_string(a).cmp(&key_string(b)))
}

/// Degré total (pour l’ordre des termes) : x -> 1, x^n -> n, produit -> somme.
fn degre(e: &Expr) -> BigRational {
    match e {
        Expr::Var(_) => BigRational::one(),
        Expr::Pow(b, n) => match n.as_ref() {
            Expr::Rat(r) => degre(b) * r,
            _ => BigRational::zero(),
        },
        _ => BigRational::zero(),
    }
}

/* ------------------------ aplatissement ------------------------ */

fn collect_addsub(e: Expr, negatif: bool, out: &mut Vec<Expr>) {
    use Expr::*;
    match e {
        Add(a, b) => {
            collect_addsub(*a, negatif, out);
            collect_addsub(*b, negatif, out);
        }
        Sub(a, b) => {
            collect_addsub(*a, negatif, out);
            collect_addsub(*b, !negatif, out);
        }
        other if negatif => out.push(Expr::neg(other)),
        other => out.push(other),
    }
}

fn collect_muldiv(e: Expr, inverse: bool, out: &mut Vec<Expr>) {
    use Expr::*;
    match e {
        Mul(a, b) => {
            collect_muldiv(*a, inverse, out);
            collect_muldiv(*b, inverse, out);
        }
        Div(a, b) => {
            collect_muldiv(*a, inverse, out);
            collect_muldiv(*b, !inverse, out);
        }
        other if inverse => out.push(Expr::pow(other, Expr::entier(-1))),
        other => out.push(other),
    }
}

fn aplatir_somme(e: Expr, out: &mut Vec<Expr>) {
    match e {
        Expr::Add(a, b) => {
            aplatir_somme(*a, out);
            aplatir_somme(*b, out);
        }
        autre => out.push(autre),
    }
}

pub(crate) fn aplatir_produit(e: Expr, out: &mut Vec<Expr>) {
    match e {
        Expr::Mul(a, b) => {
            aplatir_produit(*a, out);
            aplatir_produit(*b, out);
        }
        autre => out.push(autre),
    }
}

/// Terme canonique -> (coefficient, facteurs non rationnels triés).
pub(crate) fn decompose_terme(t: Expr) -> (BigRational, Vec<Expr>) {
    let mut facteurs = Vec::new();
    aplatir_produit(t, &mut facteurs);

    let mut coeff = BigRational::one();
    let mut reste = Vec::with_capacity(facteurs.len());
    for f in facteurs {
        match f {
            Expr::Rat(r) => coeff *= r,
            autre => reste.push(autre),
        }
    }
    (coeff, reste)
}

/* ------------------------ reconstruction ------------------------ */

fn construire_produit(coeff: BigRational, facteurs: Vec<Expr>) -> Expr {
    if coeff.is_zero() {
        return Expr::zero();
    }

    let mut it = facteurs.into_iter();
    let Some(premier) = it.next() else {
        return Expr::Rat(coeff);
    };

    let mut acc = if coeff.is_one() {
        premier
    } else {
        Expr::mul(Expr::Rat(coeff), premier)
    };
    for f in it {
        acc = Expr::mul(acc, f);
    }
    acc
}

fn construire_somme(termes: Vec<Expr>) -> Expr {
    let mut it = termes.into_iter();
    let Some(mut acc) = it.next() else {
        return Expr::zero();
    };
    for t in it {
        acc = Expr::add(acc, t);
    }
    acc
}

/* ------------------------ Somme ------------------------ */

/// Somme de termes déjà canoniques.
pub(crate) fn canon_somme(termes: Vec<Expr>) -> Expr {
    let mut plats = Vec::with_capacity(termes.len());
    for t in termes {
        aplatir_somme(t, &mut plats);
    }

    let mut constante = BigRational::zero();
    let mut groupes: Vec<(String, Vec<Expr>, BigRational)> = Vec::new();

    for t in plats {
        let (c, facteurs) = decompose_terme(t);
        if facteurs.is_empty() {
            constante += c;
            continue;
        }
        let cle = facteurs.iter().map(key_string).collect::<Vec<_>>().join("*");
        match groupes.iter_mut().find(|g| g.0 == cle) {
            Some(g) => g.2 += c,
            None => groupes.push((cle, facteurs, c)),
        }
    }

    let mut v: Vec<(BigRational, String, Expr)> = groupes
        .into_iter()
        .filter(|g| !g.2.is_zero())
        .map(|(cle, facteurs, c)| {
            let deg = facteurs.iter().map(degre).fold(BigRational::zero(), |a, b| a + b);
            (deg, cle, construire_produit(c, facteurs))
        })
        .collect();

    // degré décroissant, puis clef ; la constante en dernier
    v.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let mut out: Vec<Expr> = v.into_iter().map(|x| x.2).collect();
    if !constante.is_zero() {
        out.push(Expr::Rat(constante));
    }
    construire_somme(out)
}

/* ------------------------ Produit ------------------------ */

/// Produit de facteurs déjà canoniques.
pub(crate) fn canon_produit(facteurs: Vec<Expr>) -> Expr {
    canon_produit_n(facteurs, 0)
}

fn canon_produit_n(facteurs: Vec<Expr>, repasse: usize) -> Expr {
    let mut plats = Vec::with_capacity(facteurs.len());
    for f in facteurs {
        aplatir_produit(f, &mut plats);
    }

    let mut coeff = BigRational::one();
    // (clé de la base, base, exposants à additionner)
    let mut bases: Vec<(String, Expr, Vec<Expr>)> = Vec::new();

    for f in plats {
        let (base, exposant) = match f {
            Expr::Rat(r) => {
                if r.is_zero() {
                    return Expr::zero();
                }
                coeff *= r;
                continue;
            }
            Expr::Pow(b, e) => (*b, *e),
            autre => (autre, Expr::un()),
        };
        let cle = key_string(&base);
        match bases.iter_mut().find(|b| b.0 == cle) {
            Some(b) => b.2.push(exposant),
            None => bases.push((cle, base, vec![exposant])),
        }
    }

    // √u·√v => √(uv) pour u, v rationnels > 0 (même exposant fractionnaire)
    let mut sortie: Vec<Expr> = Vec::with_capacity(bases.len());
    let mut racines: Vec<(BigRational, BigRational)> = Vec::new();
    for (_, base, exposants) in bases {
        let e = canon_somme(exposants);
        if let (Expr::Rat(b), Expr::Rat(r)) = (&base, &e) {
            if b.is_positive() && !r.is_integer() {
                match racines.iter_mut().find(|g| g.0 == *r) {
                    Some(g) => g.1 *= b,
                    None => racines.push((r.clone(), b.clone())),
                }
                continue;
            }
        }
        sortie.push(canon_pow(base, e));
    }
    for (r, b) in racines {
        sortie.push(canon_pow(Expr::Rat(b), Expr::Rat(r)));
    }

    // Les puissances reconstruites peuvent redonner des rationnels ou des produits.
    let mut finaux: Vec<Expr> = Vec::with_capacity(sortie.len());
    let mut eclate = false;
    for f in sortie {
        let mut sous = Vec::new();
        if matches!(f, Expr::Mul(_, _)) {
            eclate = true;
        }
        aplatir_produit(f, &mut sous);
        for s in sous {
            match s {
                Expr::Rat(r) => coeff *= r,
                autre => finaux.push(autre),
            }
        }
    }
    if coeff.is_zero() {
        return Expr::zero();
    }

    if eclate && repasse < MAX_REPASSES && a_des_bases_en_double(&finaux) {
        let mut v = Vec::with_capacity(finaux.len() + 1);
        v.push(Expr::Rat(coeff));
        v.extend(finaux);
        return canon_produit_n(v, repasse + 1);
    }

    finaux.sort_by(cmp_facteur);

    // rationnel · somme => somme distribuée
    if finaux.len() == 1 && !coeff.is_one() && matches!(finaux[0], Expr::Add(_, _)) {
        let mut termes = Vec::new();
        aplatir_somme(finaux.remove(0), &mut termes);
        return canon_somme(
            termes
                .into_iter()
                .map(|t| canon_produit(vec![Expr::Rat(coeff.clone()), t]))
                .collect(),
        );
    }

    construire_produit(coeff, finaux)
}

fn a_des_bases_en_double(facteurs: &[Expr]) -> bool {
    let mut vues: Vec<String> = Vec::with_capacity(facteurs.len());
    for f in facteurs {
        let base = match f {
            Expr::Pow(b, _) => b.as_ref(),
            autre => autre,
        };
        let cle = key_string(base);
        if vues.contains(&cle) {
            return true;
        }
        vues.push(cle);
    }
    false
}

/* ------------------------ Puissance ------------------------ */

/// base^exposant, arguments déjà canoniques.
pub(crate) fn canon_pow(base: Expr, exposant: Expr) -> Expr {
    use Expr::*;

    if exposant.est_zero() || base.est_un() {
        return Expr::un();
    }
    if exposant.est_un() {
        return base;
    }

    match (&base, &exposant) {
        (Rat(b), Rat(n)) => {
            puissance_rationnelle(b, n).unwrap_or_else(|| Pow(Box::new(base), Box::new(exposant)))
        }

        (Const(Constante::I), Rat(n)) if n.is_integer() => {
            let k = n.to_integer().mod_floor_4();
            match k {
                0 => Expr::un(),
                1 => Const(Constante::I),
                2 => Expr::entier(-1),
                _ => Expr::neg(Const(Constante::I)),
            }
        }

        (Const(Constante::E), Ln(x)) => (**x).clone(),

        // (x^a)^n => x^(a·n) pour n entier
        (Pow(b, e1), Rat(n)) if n.is_integer() => {
            let e = canon_produit(vec![(**e1).clone(), exposant.clone()]);
            canon_pow((**b).clone(), e)
        }

        // (x·y)^n => x^n · y^n pour n entier
        (Mul(_, _), Rat(n)) if n.is_integer() => {
            let mut facteurs = Vec::new();
            aplatir_produit(base.clone(), &mut facteurs);
            canon_produit(
                facteurs
                    .into_iter()
                    .map(|f| canon_pow(f, exposant.clone()))
                    .collect(),
            )
        }

        _ => Pow(Box::new(base), Box::new(exposant)),
    }
}

trait ModQuatre {
    fn mod_floor_4(&self) -> u8;
}

impl ModQuatre for BigInt {
    fn mod_floor_4(&self) -> u8 {
        let quatre = BigInt::from(4);
        let mut r = self % &quatre;
        if r.is_negative() {
            r += &quatre;
        }
        r.to_u8().unwrap_or(0)
    }
}

fn trop_gros(b: &BigRational, k: &BigInt) -> bool {
    let bits = b.numer().bits().max(b.denom().bits());
    match k.abs().to_u64() {
        Some(k) => bits.saturating_mul(k) > MAX_BITS_PUISSANCE,
        None => true,
    }
}

/// b^n exact quand c’est possible ; None => on garde la forme symbolique.
fn puissance_rationnelle(b: &BigRational, n: &BigRational) -> Option<Expr> {
    if n.is_integer() {
        let k = n.to_integer();
        if trop_gros(b, &k) {
            return None;
        }
        return rational_pow_int(b, k.to_i64()?).map(Expr::Rat);
    }

    if b.is_zero() {
        return n.is_positive().then(Expr::zero);
    }

    // n = m + s/q, 0 < s < q
    let q = n.denom().clone();
    let m = n.floor().to_integer();
    let s = n.numer() - &m * &q;
    if trop_gros(b, &m) {
        return None;
    }
    let partie_entiere = rational_pow_int(b, m.to_i64()?)?;

    if q == BigInt::from(2) {
        // √(a/d) = √(a·d)/d, √(-x) = i√x
        let negatif = b.is_negative();
        let abs = b.abs();
        let (sq, t) = extrait_carre_parfait(&(abs.numer() * abs.denom()));
        let coeff = partie_entiere * BigRational::new(sq, abs.denom().clone());

        let mut facteurs = Vec::new();
        if negatif {
            facteurs.push(Expr::Const(Constante::I));
        }
        if !t.is_one() {
            facteurs.push(Expr::pow(Expr::Rat(BigRational::from_integer(t)), Expr::rat(1, 2)));
        }
        facteurs.sort_by(cmp_facteur);
        return Some(construire_produit(coeff, facteurs));
    }

    if b.is_negative() {
        return None;
    }

    // racine q-ième exacte ?
    let q_u32 = q.to_u32()?;
    let rn = b.numer().nth_root(q_u32);
    let rd = b.denom().nth_root(q_u32);
    if rn.pow(q_u32) == *b.numer() && rd.pow(q_u32) == *b.denom() {
        let racine = BigRational::new(rn, rd);
        let s_i64 = s.to_i64()?;
        return Some(Expr::Rat(partie_entiere * rational_pow_int(&racine, s_i64)?));
    }

    let reste = Expr::pow(Expr::Rat(b.clone()), Expr::Rat(BigRational::new(s, q)));
    Some(construire_produit(partie_entiere, vec![reste]))
}

/* ------------------------ Fonctions ------------------------ */

#[derive(Clone, Copy, Debug)]
enum Trig {
    Sin,
    Cos,
    Tan,
}

/// x = c·π (ou 0) => Some(c).
fn coeff_pi(x: &Expr) -> Option<BigRational> {
    match x {
        Expr::Rat(r) if r.is_zero() => Some(BigRational::zero()),
        Expr::Const(Constante::Pi) => Some(BigRational::one()),
        Expr::Mul(a, b) => match (a.as_ref(), b.as_ref()) {
            (Expr::Rat(c), Expr::Const(Constante::Pi)) => Some(c.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// sin(aπ) pour a multiple de 1/6 ou 1/4.
fn sin_pi(a: &BigRational) -> Option<Expr> {
    let deux = BigRational::from_integer(BigInt::from(2));
    let un = BigRational::one();
    let demi = BigRational::new(BigInt::one(), BigInt::from(2));
    let trois_demis = BigRational::new(BigInt::from(3), BigInt::from(2));

    // réduction dans [0, 2)
    let r = a - &deux * (a / &deux).floor();

    let (b, negatif) = if r <= demi {
        (r, false)
    } else if r <= un {
        (&un - r, false)
    } else if r <= trois_demis {
        (r - &un, true)
    } else {
        (&deux - r, true)
    };

    let table = |n: i64, d: i64| BigRational::new(BigInt::from(n), BigInt::from(d));
    let v = if b.is_zero() {
        Expr::zero()
    } else if b == table(1, 6) {
        Expr::rat(1, 2)
    } else if b == table(1, 4) {
        Expr::mul(Expr::rat(1, 2), Expr::pow(Expr::entier(2), Expr::rat(1, 2)))
    } else if b == table(1, 3) {
        Expr::mul(Expr::rat(1, 2), Expr::pow(Expr::entier(3), Expr::rat(1, 2)))
    } else if b == demi {
        Expr::un()
    } else {
        return None;
    };

    Some(if negatif { canon_produit(vec![Expr::entier(-1), v]) } else { v })
}

fn canon_trig(f: Trig, x: Expr) -> Expr {
    if let Some(a) = coeff_pi(&x) {
        let demi = BigRational::new(BigInt::one(), BigInt::from(2));
        let valeur = match f {
            Trig::Sin => sin_pi(&a),
            Trig::Cos => sin_pi(&(&a + &demi)),
            Trig::Tan => match (sin_pi(&a), sin_pi(&(&a + &demi))) {
                // cos nul : tan indéfinie, on garde la forme symbolique
                (Some(s), Some(c)) if !c.est_zero() => {
                    Some(canon_produit(vec![s, canon_pow(c, Expr::entier(-1))]))
                }
                _ => None,
            },
        };
        if let Some(v) = valeur {
            return v;
        }
    }

    // parité : sin(-x) = -sin(x), cos(-x) = cos(x), tan(-x) = -tan(x)
    let (c, _) = decompose_terme(x.clone());
    if c.is_negative() {
        let oppose = canon_produit(vec![Expr::entier(-1), x]);
        return match f {
            Trig::Sin => canon_produit(vec![Expr::entier(-1), Expr::Sin(Box::new(oppose))]),
            Trig::Tan => canon_produit(vec![Expr::entier(-1), Expr::Tan(Box::new(oppose))]),
            Trig::Cos => Expr::Cos(Box::new(oppose)),
        };
    }

    match f {
        Trig::Sin => Expr::Sin(Box::new(x)),
        Trig::Cos => Expr::Cos(Box::new(x)),
        Trig::Tan => Expr::Tan(Box::new(x)),
    }
}

fn canon_ln(x: Expr) -> Expr {
    match x {
        Expr::Rat(ref r) if r.is_one() => Expr::zero(),
        Expr::Const(Constante::E) => Expr::un(),
        Expr::Pow(b, e) if matches!(b.as_ref(), Expr::Const(Constante::E)) => *e,
        autre => Expr::Ln(Box::new(autre)),
    }
}
