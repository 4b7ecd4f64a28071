//! Tests fuzz safe : propriétés (proptest) + robustesse déterministe.
//!
//! - formateur : relecture dans la tolérance, zéro, frontière du seuil d’exposant
//! - constantes : la résolution est idempotente
//! - canon : idempotente, valeur conservée (polynômes)
//! - pipeline complet sur LaTeX généré : jamais de panique, budget borné

use std::time::{Duration, Instant};

use proptest::prelude::*;

use super::canon::canon_expr;
use super::eval::{Commande, Evaluateur};
use super::expr::Expr;
use super::format::formater;
use super::numerique::evaluer;
use super::{ErreurEval, TableConstantes};

/* ------------------------ Helpers ------------------------ */

/// Relit le texte du formateur : "m × 10^{e}" ou décimal simple.
fn relire(texte: &str) -> f64 {
    match texte.split_once(" × 10^{") {
        Some((m, e)) => {
            let m: f64 = m.parse().unwrap();
            let e: i32 = e.trim_end_matches('}').parse().unwrap();
            m * 10f64.powi(e)
        }
        None => texte.parse().unwrap(),
    }
}

fn budget(start: Instant, max: Duration) {
    if start.elapsed() > max {
        panic!("budget temps dépassé: {:?}", max);
    }
}

/* ------------------------ Stratégies ------------------------ */

/// Polynômes en x, y : entiers petits, +, -, ·, négation.
fn polynome() -> impl Strategy<Value = Expr> {
    let feuille = prop_oneof![
        (-6i64..=6).prop_map(Expr::entier),
        Just(Expr::var("x")),
        Just(Expr::var("y")),
    ];
    feuille.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::add(a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::sub(a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::mul(a, b)),
            inner.prop_map(Expr::neg),
        ]
    })
}

/// Arbres mêlant symboles de la table, alias et inconnues.
fn avec_symboles() -> impl Strategy<Value = Expr> {
    let feuille = prop_oneof![
        (-4i64..=4).prop_map(Expr::entier),
        prop::sample::select(vec!["x", "c", "g", "pi", "e", "i", "theta"]).prop_map(Expr::var),
    ];
    feuille.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::add(a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::mul(a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::div(a, b)),
            inner.prop_map(|a| Expr::Sin(Box::new(a))),
        ]
    })
}

/// Repli flottant direct d’un polynôme brut ; le second membre borne la valeur absolue.
fn plier(e: &Expr, x: f64, y: f64) -> (f64, f64) {
    match e {
        Expr::Rat(r) => {
            let v = num_traits::ToPrimitive::to_f64(r).unwrap();
            (v, v.abs())
        }
        Expr::Var(s) if s == "x" => (x, x.abs()),
        Expr::Var(_) => (y, y.abs()),
        Expr::Add(a, b) | Expr::Sub(a, b) => {
            let ((va, ma), (vb, mb)) = (plier(a, x, y), plier(b, x, y));
            let v = if matches!(e, Expr::Add(..)) { va + vb } else { va - vb };
            (v, ma + mb)
        }
        Expr::Mul(a, b) => {
            let ((va, ma), (vb, mb)) = (plier(a, x, y), plier(b, x, y));
            (va * vb, ma * mb)
        }
        autre => panic!("nœud inattendu dans un polynôme: {autre:?}"),
    }
}

/* ------------------------ Propriétés ------------------------ */

proptest! {
    #[test]
    fn formateur_relecture(v in -1e12f64..1e12, dp in 0i32..8) {
        let r = formater(v, dp).unwrap();
        let lu = relire(&r.texte);
        let tolerance = if r.exact {
            10f64.powi(-dp) + 1e-9 * v.abs()
        } else {
            10f64.powi(1 - dp) * v.abs()
        };
        prop_assert!((lu - v).abs() <= tolerance, "{v} -> {:?} relu {lu}", r.texte);
    }

    #[test]
    fn formateur_zero(dp in -10i32..20) {
        let r = formater(0.0, dp).unwrap();
        prop_assert_eq!((r.texte.as_str(), r.exact), ("0", true));
    }

    #[test]
    fn formateur_frontiere_seuil(m in 1.01f64..9.4, signe in prop::bool::ANY, dp in 0i32..6) {
        let m = if signe { -m } else { m };
        for k in [-3, 3] {
            let r = formater(m * 10f64.powi(k), dp).unwrap();
            prop_assert!(r.exact && !r.texte.contains('×'), "10^{k}: {:?}", r.texte);
        }
        for k in [-4, 4] {
            let r = formater(m * 10f64.powi(k), dp).unwrap();
            prop_assert!(!r.exact, "10^{k}: {:?}", r.texte);
            prop_assert!(r.texte.ends_with(&format!("× 10^{{{k}}}")), "10^{k}: {:?}", r.texte);
        }
    }

    #[test]
    fn resolution_idempotente(e in avec_symboles()) {
        let mut table = TableConstantes::par_defaut();
        table.definir("g", Expr::rat(981, 100)).unwrap();
        let une = table.resoudre(&e);
        prop_assert_eq!(table.resoudre(&une), une);
    }

    #[test]
    fn canon_idempotente(e in polynome()) {
        let une = canon_expr(e);
        prop_assert_eq!(canon_expr(une.clone()), une);
    }

    #[test]
    fn canon_conserve_la_valeur(e in polynome()) {
        let (x, y) = (Expr::rat(3, 7), Expr::rat(-5, 4));
        let (attendu, borne) = plier(&e, 3.0 / 7.0, -1.25);
        let simple = canon_expr(e).substitue("x", &x).substitue("y", &y);
        let v = evaluer(&simple).unwrap();
        prop_assert!(
            (v - attendu).abs() <= 1e-9 * borne.max(1.0),
            "{simple} : {v} vs {attendu}"
        );
    }
}

/* ------------------------ RNG déterministe minimal ------------------------ */

#[derive(Clone)]
struct Rng {
    state: u64,
}
impl Rng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }
    fn next_u32(&mut self) -> u32 {
        // LCG simple (déterministe)
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }
    fn pick(&mut self, n: u32) -> u32 {
        if n == 0 {
            0
        } else {
            self.next_u32() % n
        }
    }
}

/* ------------------------ Génération LaTeX (bornée) ------------------------ */

fn gen_nombre(rng: &mut Rng) -> String {
    let a = rng.pick(8);
    match rng.pick(3) {
        0 => format!("\\frac{{{a}}}{{{}}}", rng.pick(7) + 1),
        1 => format!("{a}.{}", rng.pick(100)),
        _ => a.to_string(),
    }
}

fn gen_angle(rng: &mut Rng) -> String {
    let k = rng.pick(13) as i32 - 6;
    let d = [1, 2, 3, 4, 6][rng.pick(5) as usize];
    format!("\\frac{{{k}\\pi}}{{{d}}}")
}

fn gen_atome(rng: &mut Rng) -> String {
    match rng.pick(5) {
        0 | 1 => gen_nombre(rng),
        2 => "\\pi".to_string(),
        3 => "e".to_string(),
        _ => format!("\\sqrt{{{}}}", rng.pick(13)),
    }
}

fn gen_latex(rng: &mut Rng, profondeur: usize) -> String {
    if profondeur == 0 {
        return gen_atome(rng);
    }
    let p = profondeur - 1;
    match rng.pick(10) {
        0 => gen_atome(rng),
        1 => format!("({} + {})", gen_latex(rng, p), gen_latex(rng, p)),
        2 => format!("({} - {})", gen_latex(rng, p), gen_latex(rng, p)),
        3 => format!("{} \\cdot {}", gen_latex(rng, p), gen_latex(rng, p)),
        4 => format!("\\frac{{{}}}{{{}}}", gen_latex(rng, p), gen_latex(rng, p)),
        5 => format!("({})^{{{}}}", gen_latex(rng, p), rng.pick(4)),
        6 => format!("\\sin({})", gen_angle(rng)),
        7 => format!("\\cos({})", gen_angle(rng)),
        8 => format!("\\tan({})", gen_angle(rng)),
        _ => format!("\\ln({})", gen_latex(rng, p)),
    }
}

fn somme_balancee(terme: &str, n: usize) -> String {
    let mut items: Vec<String> = (0..n).map(|_| terme.to_string()).collect();
    while items.len() > 1 {
        items = items
            .chunks(2)
            .map(|paire| match paire {
                [a, b] => format!("({a} + {b})"),
                [a] => a.clone(),
                _ => unreachable!(),
            })
            .collect();
    }
    items.pop().unwrap_or_else(|| "0".to_string())
}

/* ------------------------ Tests ------------------------ */

#[test]
fn fuzz_safe_pipeline_sans_panique() {
    let t0 = Instant::now();
    let max = Duration::from_millis(2000);
    let ev = Evaluateur::default();
    let mut rng = Rng::new(0xC0FFEE_u64);

    let mut vus_ok = 0usize;
    for _ in 0..150 {
        budget(t0, max);
        let expr = gen_latex(&mut rng, 4);

        match ev.dispatch(&Commande::Numerique { expr: expr.clone() }) {
            Ok(_) => vus_ok += 1,
            // division par zéro, logarithme hors domaine, tangente infinie...
            Err(ErreurEval::Evaluation(_)) | Err(ErreurEval::Format(_)) => {}
            Err(e) => panic!("erreur non attendue: expr={expr:?} err={e}"),
        }
        let _ = ev.dispatch(&Commande::Symbolique { expr });
    }
    assert!(vus_ok > 30, "trop peu de succès: {vus_ok}");
}

#[test]
fn fuzz_safe_determinisme() {
    let ev = Evaluateur::default();
    let tour = |seed| {
        let mut rng = Rng::new(seed);
        (0..40)
            .map(|_| {
                let expr = gen_latex(&mut rng, 3);
                format!("{:?}", ev.dispatch(&Commande::Symbolique { expr }))
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(tour(0xBADC0DE_u64), tour(0xBADC0DE_u64));
}

#[test]
fn fuzz_safe_somme_balancee_anti_pile() {
    let t0 = Instant::now();
    let max = Duration::from_millis(1000);

    let expr = somme_balancee("\\frac{1}{2}", 800);
    let ev = Evaluateur::default();
    let num = ev.dispatch(&Commande::Numerique { expr: expr.clone() }).unwrap();
    let sym = ev.dispatch(&Commande::Symbolique { expr }).unwrap();
    budget(t0, max);

    // 800·(1/2) = 400
    assert_eq!(num.to_string(), " = 400");
    assert_eq!(sym.to_string(), " = 400");
}
