//! Tests scientifiques (campagne) : invariants du pipeline complet + limites contrôlées.
//!
//! - exemples de référence (solve, diff, formateur)
//! - cohérence symbolique / numérique
//! - dérivées contre différences finies
//! - stress borné (budget temps, profondeur modérée)

use std::time::{Duration, Instant};

use super::canon::canon_expr;
use super::derivee::deriver;
use super::eval::{Commande, Evaluateur};
use super::expr::Expr;
use super::numerique::evaluer;
use super::rpn::lire_latex;
use super::TableConstantes;

fn sortie(c: Commande) -> String {
    Evaluateur::default()
        .dispatch(&c)
        .unwrap_or_else(|e| panic!("commande={c:?} err={e}"))
        .to_string()
}

fn num(expr: &str) -> String {
    sortie(Commande::Numerique { expr: expr.into() })
}

fn sym(expr: &str) -> String {
    sortie(Commande::Symbolique { expr: expr.into() })
}

fn assert_sym_eq(expr: &str, attendu: &str) {
    assert_eq!(sym(expr), format!(" = {attendu}"), "expr={expr:?}");
}

/// Budget global anti-gel.
fn budget(start: Instant, max: Duration) {
    if start.elapsed() > max {
        panic!("budget temps dépassé: {:?}", max);
    }
}

/* ------------------------ Exemples de référence ------------------------ */

#[test]
fn sci_reference_cli() {
    assert_eq!(
        sortie(Commande::Resolution {
            gauche: "x + 2".into(),
            droite: "5".into(),
            var: "x".into(),
        }),
        "x = 3"
    );
    assert_eq!(
        sortie(Commande::Derivation {
            expr: "x^2".into(),
            symboles: vec!["x".into()],
            var: "x".into(),
        }),
        "2*x"
    );
    assert_eq!(num("1000"), " = 1000");
    assert_eq!(num("299792458"), " ≈ 2.998 × 10^{8}");
}

/* ------------------------ Invariants trig (angles spéciaux) ------------------------ */

#[test]
fn sci_identites_symetrie() {
    // sin(-x) = -sin(x)
    assert_sym_eq("\\sin(-\\frac{\\pi}{4})", "-\\frac{\\sqrt{2}}{2}");
    assert_sym_eq("\\sin(\\frac{\\pi}{4})", "\\frac{\\sqrt{2}}{2}");

    // cos(-x) = cos(x)
    assert_sym_eq("\\cos(-\\frac{\\pi}{3})", "\\frac{1}{2}");

    // tan(-x) = -tan(x)
    assert_sym_eq("\\tan(-\\frac{\\pi}{6})", "-\\frac{\\sqrt{3}}{3}");
}

#[test]
fn sci_periodicite_angles() {
    // π/4 + 2π = 9π/4 ; π/3 + 2π = 7π/3
    assert_sym_eq("\\sin(\\frac{9\\pi}{4})", "\\frac{\\sqrt{2}}{2}");
    assert_sym_eq("\\cos(\\frac{7\\pi}{3})", "\\frac{1}{2}");
}

/* ------------------------ Cohérence algébrique (zéro) ------------------------ */

#[test]
fn sci_zero_algebrique() {
    assert_sym_eq("(\\frac{1}{2} + \\frac{1}{3}) - \\frac{5}{6}", "0");
    assert_sym_eq("\\sqrt{2}\\sqrt{2} - 2", "0");
    assert_sym_eq("(x + 1) - (1 + x)", "0");
    // rationalisation : 1/√3 = √3/3
    assert_sym_eq("\\frac{1}{\\sqrt{3}}", "\\frac{\\sqrt{3}}{3}");
}

#[test]
fn sci_symbolique_contre_numerique() {
    let cas: [(&str, f64); 5] = [
        ("\\frac{1}{2} + \\sin(1)", 0.5 + 1f64.sin()),
        ("\\sqrt{12} \\cdot 3", 12f64.sqrt() * 3.0),
        ("(2 + \\sqrt{3})^{2}", (2.0 + 3f64.sqrt()).powi(2)),
        ("\\frac{\\ln(8)}{\\ln(2)}", 3.0),
        ("e^{\\ln(5)} + \\pi", 5.0 + std::f64::consts::PI),
    ];
    for (s, attendu) in cas {
        let arbre = TableConstantes::vide().resoudre(&lire_latex(s).unwrap());
        let simple = canon_expr(arbre);
        let v = evaluer(&simple).unwrap();
        assert!(
            (v - attendu).abs() <= 1e-12 * attendu.abs().max(1.0),
            "expr={s:?} ({simple}) : {v} vs {attendu}"
        );
    }
}

/* ------------------------ Dérivées : différences finies ------------------------ */

#[test]
fn sci_derivees_differences_finies() {
    let x0 = Expr::rat(7, 10);
    let h = 1e-6;

    for s in [
        "x^3 - 2x",
        "\\sin(x) \\cos(x)",
        "\\frac{x + 1}{x^2}",
        "\\sqrt{x} \\ln(x)",
        "\\exp(x^2)",
        "x^{x}",
        "\\tan(2x)",
    ] {
        let f = TableConstantes::vide().resoudre(&lire_latex(s).unwrap());
        let df = deriver(&f, "x");

        let en = |v: f64| {
            let e = f.substitue("x", &lire_latex(&format!("{v}")).unwrap());
            evaluer(&e).unwrap()
        };
        let approx = (en(0.7 + h) - en(0.7 - h)) / (2.0 * h);
        let exact = evaluer(&df.substitue("x", &x0)).unwrap();

        assert!(
            (approx - exact).abs() <= 1e-5 * exact.abs().max(1.0),
            "d/dx {s:?} : {exact} vs {approx} (dérivée {df})"
        );
    }
}

/* ------------------------ Résolution : back-substitution ------------------------ */

#[test]
fn sci_solutions_verifiees() {
    for (g, d) in [
        ("3x - 7", "2"),
        ("x^2 + x", "6"),
        ("2x^2", "3 - x"),
        ("\\sqrt{x + 1}", "3"),
        ("\\ln(x)", "2"),
        ("10^{x}", "1000"),
    ] {
        let gauche = lire_latex(g).unwrap();
        let droite = lire_latex(d).unwrap();
        let sols = super::solveur::resoudre(&gauche, &droite, "x");
        assert!(!sols.is_empty(), "{g} = {d}");
        for s in sols {
            let r = evaluer(&Expr::sub(gauche.substitue("x", &s), droite.substitue("x", &s))).unwrap();
            assert!(r.abs() < 1e-9, "{g} = {d} : x = {s} donne {r}");
        }
    }
}

/* ------------------------ Stress contrôlé (sans brûler) ------------------------ */

#[test]
fn sci_stress_profondeur_racines() {
    let t0 = Instant::now();
    let max = Duration::from_millis(500);

    // √ et ^2 alternés : reste un carré parfait à chaque étape
    let mut expr = "4".to_string();
    for k in 0..60 {
        expr = if k % 2 == 0 {
            format!("\\sqrt{{{expr}}}")
        } else {
            format!("({expr})^{{2}}")
        };
    }
    assert_eq!(num(&expr), " = 4");
    budget(t0, max);
}

#[test]
fn sci_stress_taille_somme() {
    let t0 = Instant::now();
    let max = Duration::from_millis(500);

    let expr = vec!["\\frac{1}{2}"; 80].join(" + ");
    assert_eq!(num(&expr), " = 40");
    assert_sym_eq(&expr, "40");
    budget(t0, max);
}

#[test]
fn sci_stress_bigint() {
    let t0 = Instant::now();
    let max = Duration::from_millis(500);

    // 10^100 / 7, sans perte avant le repli flottant
    let big = "9".repeat(100);
    let expr = format!("\\frac{{{big}}}{{7}} + \\frac{{1}}{{7}}");
    assert_eq!(num(&expr), " ≈ 1.429 × 10^{99}");
    budget(t0, max);
}

#[test]
fn sci_stress_puissance_bornee() {
    let t0 = Instant::now();
    let max = Duration::from_millis(500);

    // exposant énorme : la forme reste symbolique, pas de gel
    let s = sym("2^{10000000}");
    assert!(s.contains("2^{10000000}"), "{s}");
    budget(t0, max);
}
