// src/noyau/rpn.rs
//
// Jetons LaTeX -> jetons normalisés -> RPN -> Expr
// Objectif:
// - Déplier les constructions LaTeX (\frac{a}{b}, \sqrt[n]{a}, groupes { } [ ])
//   en une suite plate de parenthèses et d’opérateurs
// - Insérer le produit implicite (2x, 2\pi r, (a)(b))
// - Shunting-yard -> RPN, puis reconstruction Expr
//
// Règles:
// - Fonction(f) est toujours suivie de son argument entre parenthèses après normalisation
// - Moins unaire : jeton Neg (préfixe), plus fort que * et plus faible que ^ :
//   "-x^2" => -(x^2), "2*-3" => 2*(-3)

use num_bigint::BigInt;
use num_rational::BigRational;

use super::expr::Expr;
use super::jetons::{tokenize, Fonction, Tok};

fn precedence(t: &Tok) -> i32 {
    match t {
        Tok::Plus | Tok::Minus => 1,
        Tok::Star | Tok::Slash => 2,
        Tok::Neg => 3,
        Tok::Caret => 4,
        _ => 0,
    }
}

fn is_right_associative(t: &Tok) -> bool {
    matches!(t, Tok::Caret | Tok::Neg)
}

fn est_ouvrante(t: &Tok) -> bool {
    matches!(t, Tok::LPar | Tok::LAcc | Tok::LCrochet)
}

fn est_fermante(t: &Tok) -> bool {
    matches!(t, Tok::RPar | Tok::RAcc | Tok::RCrochet)
}

/// Traduction complète : texte LaTeX -> Expr.
pub fn lire_latex(s: &str) -> Result<Expr, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("entrée vide".into());
    }
    let jetons = tokenize(s)?;
    let plats = inserer_produits(normaliser(&jetons)?);
    let rpn = to_rpn(&plats)?;
    from_rpn(&rpn)
}

/* ------------------------ Normalisation LaTeX ------------------------ */

/// Lit un groupe `{...}`, `(...)`, `[...]` ou un atome seul à partir de `*i`.
/// Renvoie les jetons intérieurs (sans les délimiteurs) et avance `*i` après le groupe.
fn lire_groupe<'a>(toks: &'a [Tok], i: &mut usize, quoi: &str) -> Result<&'a [Tok], String> {
    let Some(t) = toks.get(*i) else {
        return Err(format!("{quoi} manquant"));
    };

    if matches!(t, Tok::Num(_) | Tok::Ident(_)) {
        *i += 1;
        return Ok(&toks[*i - 1..*i]);
    }
    if !est_ouvrante(t) {
        return Err(format!("{quoi} manquant"));
    }

    let debut = *i + 1;
    let mut profondeur = 0usize;
    let mut j = *i;
    while j < toks.len() {
        if est_ouvrante(&toks[j]) {
            profondeur += 1;
        } else if est_fermante(&toks[j]) {
            profondeur -= 1;
            if profondeur == 0 {
                *i = j + 1;
                return Ok(&toks[debut..j]);
            }
        }
        j += 1;
    }
    Err("groupe non fermé".into())
}

/// Déplie \frac, \sqrt[n], les fonctions sans parenthèses et les délimiteurs { } [ ].
/// Sortie : uniquement Num, Ident, Fonction, opérateurs, LPar, RPar.
fn normaliser(toks: &[Tok]) -> Result<Vec<Tok>, String> {
    let mut out: Vec<Tok> = Vec::with_capacity(toks.len() + 8);
    let mut i = 0usize;

    while i < toks.len() {
        match &toks[i] {
            Tok::Frac => {
                i += 1;
                let num = lire_groupe(toks, &mut i, "numérateur de \\frac")?;
                let den = lire_groupe(toks, &mut i, "dénominateur de \\frac")?;
                out.push(Tok::LPar);
                out.push(Tok::LPar);
                out.extend(normaliser(num)?);
                out.push(Tok::RPar);
                out.push(Tok::Slash);
                out.push(Tok::LPar);
                out.extend(normaliser(den)?);
                out.push(Tok::RPar);
                out.push(Tok::RPar);
            }

            Tok::Fonction(f) => {
                let f = *f;
                i += 1;

                // \sqrt[n]{a} => (a)^(1/(n))
                if f == Fonction::Sqrt && matches!(toks.get(i), Some(Tok::LCrochet)) {
                    let indice = lire_groupe(toks, &mut i, "indice de \\sqrt")?;
                    let arg = lire_groupe(toks, &mut i, "argument de \\sqrt")?;
                    out.push(Tok::LPar);
                    out.push(Tok::LPar);
                    out.extend(normaliser(arg)?);
                    out.push(Tok::RPar);
                    out.push(Tok::Caret);
                    out.push(Tok::LPar);
                    out.push(Tok::Num(BigRational::from_integer(BigInt::from(1))));
                    out.push(Tok::Slash);
                    out.push(Tok::LPar);
                    out.extend(normaliser(indice)?);
                    out.push(Tok::RPar);
                    out.push(Tok::RPar);
                    out.push(Tok::RPar);
                    continue;
                }

                let arg = lire_groupe(toks, &mut i, "argument de fonction")?;
                out.push(Tok::Fonction(f));
                out.push(Tok::LPar);
                out.extend(normaliser(arg)?);
                out.push(Tok::RPar);
            }

            t if est_ouvrante(t) => {
                out.push(Tok::LPar);
                i += 1;
            }
            t if est_fermante(t) => {
                out.push(Tok::RPar);
                i += 1;
            }

            autre => {
                out.push(autre.clone());
                i += 1;
            }
        }
    }

    Ok(out)
}

/// Produit implicite : valeur suivie d’un début de valeur => '*'.
fn inserer_produits(toks: Vec<Tok>) -> Vec<Tok> {
    fn fin_valeur(t: &Tok) -> bool {
        matches!(t, Tok::Num(_) | Tok::Ident(_) | Tok::RPar)
    }
    fn debut_valeur(t: &Tok) -> bool {
        matches!(t, Tok::Num(_) | Tok::Ident(_) | Tok::LPar | Tok::Fonction(_))
    }

    let mut out: Vec<Tok> = Vec::with_capacity(toks.len() * 2);
    for t in toks {
        if let Some(prec) = out.last() {
            if fin_valeur(prec) && debut_valeur(&t) {
                out.push(Tok::Star);
            }
        }
        out.push(t);
    }
    out
}

/* ------------------------ Shunting-yard ------------------------ */

/// Convertit une suite de jetons normalisés en RPN (notation polonaise inversée).
///
/// Exemple:
///   tokens: [Fonction(Sin), LPar, Ident("x"), Slash, Num(2), RPar]
///   rpn:    [Ident("x"), Num(2), Slash, Fonction(Sin)]
pub fn to_rpn(tokens: &[Tok]) -> Result<Vec<Tok>, String> {
    let mut out: Vec<Tok> = Vec::new();
    let mut ops: Vec<Tok> = Vec::new();

    // “valeur” = un atome ou une expression fermée.
    // Sert à détecter le moins unaire.
    let mut prev_was_value = false;

    for tok in tokens.iter().cloned() {
        match tok {
            Tok::Num(_) | Tok::Ident(_) => {
                out.push(tok);
                prev_was_value = true;
            }

            Tok::Fonction(_) => {
                // fonction : on la garde sur la pile (elle sortira après son argument)
                ops.push(tok);
                prev_was_value = false;
            }

            Tok::LPar => {
                ops.push(tok);
                prev_was_value = false;
            }

            Tok::RPar => {
                let mut ouverte = false;
                while let Some(top) = ops.pop() {
                    if matches!(top, Tok::LPar) {
                        ouverte = true;
                        break;
                    }
                    out.push(top);
                }
                if !ouverte {
                    return Err("parenthèse fermante sans ouvrante".into());
                }

                // si une fonction est au sommet, on la sort aussi
                if matches!(ops.last(), Some(Tok::Fonction(_))) {
                    if let Some(f) = ops.pop() {
                        out.push(f);
                    }
                }

                prev_was_value = true;
            }

            Tok::Plus | Tok::Minus if !prev_was_value => {
                // signe unaire : '+' ignoré, '-' préfixe
                if matches!(tok, Tok::Minus) {
                    ops.push(Tok::Neg);
                }
            }

            Tok::Plus | Tok::Minus | Tok::Star | Tok::Slash | Tok::Caret => {
                // dépile tant que:
                // - on n'est pas bloqué par '('
                // - et on ne traverse pas une fonction (fonction reste collée à son argument)
                // - et la précédence/associativité exige de sortir l'opérateur du haut
                while let Some(top) = ops.last() {
                    if matches!(top, Tok::LPar | Tok::Fonction(_)) {
                        break;
                    }

                    let p_top = precedence(top);
                    let p_tok = precedence(&tok);

                    let doit_pop = if is_right_associative(&tok) {
                        p_top > p_tok
                    } else {
                        p_top >= p_tok
                    };

                    if !doit_pop {
                        break;
                    }
                    if let Some(op) = ops.pop() {
                        out.push(op);
                    }
                }

                ops.push(tok);
                prev_was_value = false;
            }

            Tok::Neg => ops.push(tok),

            Tok::Frac
            | Tok::LAcc
            | Tok::RAcc
            | Tok::LCrochet
            | Tok::RCrochet => return Err("jeton non normalisé".into()),
        }
    }

    // vide la pile ops
    while let Some(op) = ops.pop() {
        if matches!(op, Tok::LPar) {
            return Err("parenthèses non fermées".into());
        }
        out.push(op);
    }

    Ok(out)
}

/// Construit une Expr à partir d’une RPN.
pub fn from_rpn(rpn: &[Tok]) -> Result<Expr, String> {
    let mut st: Vec<Expr> = Vec::new();

    for tok in rpn.iter().cloned() {
        match tok {
            Tok::Num(r) => st.push(Expr::Rat(r)),
            Tok::Ident(name) => st.push(Expr::Var(name)),

            Tok::Plus | Tok::Minus | Tok::Star | Tok::Slash | Tok::Caret => {
                let b = st.pop().ok_or("opérande manquant")?;
                let a = st.pop().ok_or("opérande manquant")?;

                let e = match tok {
                    Tok::Plus => Expr::add(a, b),
                    Tok::Minus => Expr::sub(a, b),
                    Tok::Star => Expr::mul(a, b),
                    Tok::Slash => Expr::div(a, b),
                    _ => Expr::pow(a, b),
                };
                st.push(e);
            }

            Tok::Neg => {
                let x = st.pop().ok_or("signe '-' sans opérande")?;
                st.push(Expr::neg(x));
            }

            Tok::Fonction(f) => {
                let x = st.pop().ok_or("fonction sans argument")?;
                let e = match f {
                    Fonction::Sqrt => Expr::Sqrt(Box::new(x)),
                    Fonction::Sin => Expr::Sin(Box::new(x)),
                    Fonction::Cos => Expr::Cos(Box::new(x)),
                    Fonction::Tan => Expr::Tan(Box::new(x)),
                    Fonction::Ln => Expr::Ln(Box::new(x)),
                    Fonction::Exp => Expr::exp(x),
                };
                st.push(e);
            }

            _ => return Err("parenthèse inattendue en RPN".into()),
        }
    }

    match (st.pop(), st.is_empty()) {
        (Some(e), true) => Ok(e),
        (None, _) => Err("expression vide".into()),
        (Some(_), false) => Err("expression invalide".into()),
    }
}
