// src/noyau/format.rs
//
// Formateur des résultats numériques.
// v = m × 10^e, 1 ≤ |m| < 10 :
// - |e| > 3 : notation scientifique "m × 10^{e}", toujours marquée approchée (≈)
// - sinon   : entier si |v - round(v)| < 10^-dp, sinon décimal fixe ; toujours marqué exact (=)
//
// NOTE: l’asymétrie exact/approché est voulue (compatibilité de sortie) :
// un décimal fixe arrondi reste marqué "=".

use std::fmt;

use tracing::debug;

use super::erreur::ErreurFormat;

/// Au-delà (strictement), on passe en notation scientifique.
const SEUIL_EXPOSANT: i32 = 3;

/// Chiffres imprimés au plus : un f64 n’a jamais plus de ~1074 décimales significatives.
const MAX_CHIFFRES: i32 = 1100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultatFormate {
    pub texte: String,
    pub exact: bool,
}

impl ResultatFormate {
    fn new(texte: String, exact: bool) -> Self {
        Self { texte, exact }
    }

    /// "=" si exact, "≈" sinon.
    pub fn prefixe(&self) -> &'static str {
        if self.exact {
            "="
        } else {
            "≈"
        }
    }
}

impl fmt::Display for ResultatFormate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " {} {}", self.prefixe(), self.texte)
    }
}

pub fn formater(valeur: f64, decimales: i32) -> Result<ResultatFormate, ErreurFormat> {
    if !valeur.is_finite() {
        return Err(ErreurFormat::NonFini(valeur));
    }
    if valeur == 0.0 {
        return Ok(ResultatFormate::new("0".into(), true));
    }

    let chiffres = decimales.clamp(0, MAX_CHIFFRES) as usize;
    let (mantisse, exposant) = decomposer(valeur);

    if exposant.abs() > SEUIL_EXPOSANT {
        let (m, e) = arrondir_mantisse(mantisse, exposant, chiffres);
        debug!(valeur, exposant = e, "branche scientifique");
        return Ok(ResultatFormate::new(format!("{m} × 10^{{{e}}}"), false));
    }

    let arrondi = valeur.round();
    let seuil = 10f64.powi(decimales.saturating_neg());
    if (valeur - arrondi).abs() < seuil {
        debug!(valeur, "branche entière");
        return Ok(ResultatFormate::new(sans_moins_zero(format!("{arrondi:.0}")), true));
    }

    debug!(valeur, chiffres, "branche décimale fixe");
    let texte = sans_zeros(format!("{valeur:.chiffres$}"));
    Ok(ResultatFormate::new(sans_moins_zero(texte), true))
}

/// (m, e) depuis l’écriture `{:e}` de Rust (exacte, pas de dérive de log10).
fn decomposer(v: f64) -> (f64, i32) {
    let s = format!("{v:e}");
    let lu = s
        .split_once('e')
        .and_then(|(m, e)| Some((m.parse::<f64>().ok()?, e.parse::<i32>().ok()?)));
    lu.unwrap_or_else(|| {
        let e = v.abs().log10().floor() as i32;
        (v / 10f64.powi(e), e)
    })
}

/// Arrondit m à `chiffres` décimales ; si l’arrondi atteint 10, on renormalise.
fn arrondir_mantisse(m: f64, e: i32, chiffres: usize) -> (String, i32) {
    let txt = format!("{m:.chiffres$}");
    let atteint_dix = txt.parse::<f64>().map(|r| r.abs() >= 10.0).unwrap_or(false);
    if atteint_dix {
        let m = m / 10.0;
        return (sans_zeros(format!("{m:.chiffres$}")), e + 1);
    }
    (sans_zeros(txt), e)
}

fn sans_zeros(s: String) -> String {
    if !s.contains('.') {
        return s;
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn sans_moins_zero(s: String) -> String {
    if s == "-0" {
        "0".to_string()
    } else {
        s
    }
}
