// src/noyau/jetons.rs

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fonction {
    Sin,
    Cos,
    Tan,
    Ln,
    Exp,
    Sqrt,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Tok {
    Num(BigRational),

    // Symbole (lettre latine seule, nom grec, lettre unicode), indice compris : x_1
    Ident(String),
    Fonction(Fonction),
    Frac,

    Plus,
    Minus,
    Star,
    Slash,
    Caret, // ^

    // NOTE: seulement produit par rpn (moins unaire), jamais par tokenize
    Neg,

    LPar,
    RPar,
    LAcc,
    RAcc,
    LCrochet,
    RCrochet,
}

const GRECS: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "varepsilon", "zeta", "eta", "theta",
    "vartheta", "iota", "kappa", "lambda", "mu", "nu", "xi", "pi", "rho", "sigma", "tau",
    "upsilon", "phi", "varphi", "chi", "psi", "omega", "Gamma", "Delta", "Theta", "Lambda",
    "Xi", "Pi", "Sigma", "Phi", "Psi", "Omega",
];

/// Vrai si `nom` est une lettre grecque LaTeX (rendue avec un `\`).
pub fn est_grec(nom: &str) -> bool {
    GRECS.contains(&nom)
}

/// Tokenize une chaîne LaTeX en jetons.
/// Supporte:
/// - entiers et décimaux (ex: 12, 2.5 -> Num(5/2))
/// - opérateurs + - * / ^, \cdot, \times, \div
/// - groupes ( ) [ ] { }, \left et \right ignorés
/// - \frac, \sqrt, \sin, \cos, \tan, \ln, \log, \exp
/// - lettres grecques (\alpha, \pi, ...) et lettres unicode (π, φ, ...)
/// - indices : x_1, x_{12}, \alpha_{0}
pub fn tokenize(s: &str) -> Result<Vec<Tok>, String> {
    let mut out = Vec::new();
    let chars: Vec<char> = s.chars().collect();
    let mut i: usize = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let simple = match c {
            '(' => Some(Tok::LPar),
            ')' => Some(Tok::RPar),
            '{' => Some(Tok::LAcc),
            '}' => Some(Tok::RAcc),
            '[' => Some(Tok::LCrochet),
            ']' => Some(Tok::RCrochet),
            '+' => Some(Tok::Plus),
            '-' | '−' => Some(Tok::Minus),
            '*' | '·' | '×' => Some(Tok::Star),
            '/' | '÷' => Some(Tok::Slash),
            '^' => Some(Tok::Caret),
            _ => None,
        };
        if let Some(t) = simple {
            out.push(t);
            i += 1;
            continue;
        }

        // Commandes LaTeX
        if c == '\\' {
            i += 1;
            if i >= chars.len() {
                return Err("commande LaTeX incomplète".into());
            }
            // espacements : \, \; \! \: \
            if matches!(chars[i], ',' | ';' | '!' | ':' | ' ') {
                i += 1;
                continue;
            }
            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            let cmd: String = chars[start..i].iter().collect();
            if cmd.is_empty() {
                return Err(format!("commande LaTeX inattendue: '\\{}'", chars[start]));
            }

            match cmd.as_str() {
                "left" | "right" | "quad" | "qquad" => {}
                "cdot" | "times" => out.push(Tok::Star),
                "div" => out.push(Tok::Slash),
                "frac" | "dfrac" | "tfrac" => out.push(Tok::Frac),
                "sqrt" => out.push(Tok::Fonction(Fonction::Sqrt)),
                "sin" => out.push(Tok::Fonction(Fonction::Sin)),
                "cos" => out.push(Tok::Fonction(Fonction::Cos)),
                "tan" => out.push(Tok::Fonction(Fonction::Tan)),
                "ln" | "log" => out.push(Tok::Fonction(Fonction::Ln)),
                "exp" => out.push(Tok::Fonction(Fonction::Exp)),
                "lbrace" => out.push(Tok::LAcc),
                "rbrace" => out.push(Tok::RAcc),
                g if est_grec(g) => {
                    let nom = lire_indice(&chars, &mut i, cmd.clone())?;
                    out.push(Tok::Ident(nom));
                }
                autre => return Err(format!("commande LaTeX inconnue: '\\{autre}'")),
            }
            continue;
        }

        // Nombre entier ou décimal
        if c.is_ascii_digit() || (c == '.' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit())
        {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let int_str: String = chars[start..i].iter().collect();

            let mut frac_str = String::new();
            if i < chars.len() && chars[i] == '.' {
                i += 1;
                let start_f = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                frac_str = chars[start_f..i].iter().collect();
            }

            out.push(Tok::Num(decimal_exact(&int_str, &frac_str)?));
            continue;
        }

        // Lettre (latine ou unicode) : un symbole par lettre
        if c.is_alphabetic() {
            i += 1;
            let nom = lire_indice(&chars, &mut i, c.to_string())?;
            out.push(Tok::Ident(nom));
            continue;
        }

        return Err(format!("caractère inattendu: '{c}'"));
    }

    Ok(out)
}

/// "12" + "." + "05" -> 1205/100, exact.
fn decimal_exact(int_str: &str, frac_str: &str) -> Result<BigRational, String> {
    let digits = format!("{int_str}{frac_str}");
    let digits = if digits.is_empty() { "0".to_string() } else { digits };
    let n = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or("nombre invalide")?;
    let d = BigInt::from(10).pow(frac_str.len() as u32);
    if d.is_zero() {
        return Err("nombre invalide".into());
    }
    Ok(BigRational::new(n, d))
}

/// Lit un indice éventuel après un symbole : `_1`, `_a`, `_{12}`.
/// Le nom rendu est "x_1" / "x_12".
fn lire_indice(chars: &[char], i: &mut usize, base: String) -> Result<String, String> {
    if *i >= chars.len() || chars[*i] != '_' {
        return Ok(base);
    }
    *i += 1;
    if *i >= chars.len() {
        return Err(format!("indice manquant après '{base}_'"));
    }

    let indice: String = if chars[*i] == '{' {
        *i += 1;
        let start = *i;
        while *i < chars.len() && chars[*i] != '}' {
            if !chars[*i].is_alphanumeric() {
                return Err(format!("indice invalide pour '{base}'"));
            }
            *i += 1;
        }
        if *i >= chars.len() {
            return Err("accolade d’indice non fermée".into());
        }
        let s: String = chars[start..*i].iter().collect();
        *i += 1; // '}'
        s
    } else if chars[*i].is_alphanumeric() {
        let s = chars[*i].to_string();
        *i += 1;
        s
    } else {
        return Err(format!("indice invalide pour '{base}'"));
    };

    if indice.is_empty() {
        return Err(format!("indice vide pour '{base}'"));
    }
    Ok(format!("{base}_{indice}"))
}

/// Format utilitaire (journal) : liste de jetons en texte.
pub fn format_tokens(tokens: &[Tok]) -> String {
    fn format_rat(r: &BigRational) -> String {
        let n = r.numer();
        let d = r.denom();
        if d.is_one() {
            format!("{n}")
        } else {
            format!("{n}/{d}")
        }
    }

    let mut out = Vec::new();
    for t in tokens {
        let s = match t {
            Tok::Num(r) => format_rat(r),
            Tok::Ident(name) => name.clone(),
            Tok::Fonction(f) => format!("{f:?}").to_lowercase(),
            Tok::Frac => "frac".to_string(),

            Tok::Plus => "+".to_string(),
            Tok::Minus => "-".to_string(),
            Tok::Star => "*".to_string(),
            Tok::Slash => "/".to_string(),
            Tok::Caret => "^".to_string(),
            Tok::Neg => "neg".to_string(),

            Tok::LPar => "(".to_string(),
            Tok::RPar => ")".to_string(),
            Tok::LAcc => "{".to_string(),
            Tok::RAcc => "}".to_string(),
            Tok::LCrochet => "[".to_string(),
            Tok::RCrochet => "]".to_string(),
        };
        out.push(s);
    }
    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: i64, d: i64) -> Tok {
        Tok::Num(BigRational::new(BigInt::from(n), BigInt::from(d)))
    }

    #[test]
    fn decimaux_exacts() {
        assert_eq!(tokenize("2.5").unwrap(), vec![num(5, 2)]);
        assert_eq!(tokenize(".25").unwrap(), vec![num(1, 4)]);
        assert_eq!(tokenize("10").unwrap(), vec![num(10, 1)]);
    }

    #[test]
    fn lettres_separees() {
        let t = tokenize("xy").unwrap();
        assert_eq!(t, vec![Tok::Ident("x".into()), Tok::Ident("y".into())]);
    }

    #[test]
    fn commandes() {
        let t = tokenize("\\frac{\\pi}{2} \\cdot \\left(x\\right)").unwrap();
        assert_eq!(format_tokens(&t), "frac { pi } { 2 } * ( x )");
    }

    #[test]
    fn indices() {
        let t = tokenize("x_1 + v_{max} + \\alpha_0").unwrap();
        assert_eq!(format_tokens(&t), "x_1 + v_max + alpha_0");
    }

    #[test]
    fn unicode() {
        let t = tokenize("2π × r").unwrap();
        assert_eq!(format_tokens(&t), "2 π * r");
    }

    #[test]
    fn erreurs() {
        assert!(tokenize("x = 2").unwrap_err().contains("caractère inattendu"));
        assert!(tokenize("\\foo").unwrap_err().contains("inconnue"));
        assert!(tokenize("x_").is_err());
    }
}
