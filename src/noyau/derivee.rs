// src/noyau/derivee.rs
//
// Dérivation symbolique d/dv, règle par règle, puis canonicalisation.
// L’arbre produit par `derive_brut` n’est pas simplifié : c’est canon qui nettoie
// les 0·x, 1·x et regroupe les termes.

use super::canon::canon_expr;
use super::expr::{Constante, Expr};

/// d(expr)/d(var), forme canonique.
pub fn deriver(expr: &Expr, var: &str) -> Expr {
    canon_expr(derive_brut(expr, var))
}

fn derive_brut(e: &Expr, v: &str) -> Expr {
    use Expr::*;

    // constante par rapport à v
    if !e.contient_var(v) {
        return Expr::zero();
    }

    match e {
        Rat(_) | Const(_) => Expr::zero(),
        Var(s) => {
            if s == v {
                Expr::un()
            } else {
                Expr::zero()
            }
        }

        Add(f, g) => Expr::add(derive_brut(f, v), derive_brut(g, v)),
        Sub(f, g) => Expr::sub(derive_brut(f, v), derive_brut(g, v)),

        // (fg)' = f'g + fg'
        Mul(f, g) => Expr::add(
            Expr::mul(derive_brut(f, v), (**g).clone()),
            Expr::mul((**f).clone(), derive_brut(g, v)),
        ),

        // (f/g)' = (f'g - fg') / g^2
        Div(f, g) => Expr::div(
            Expr::sub(
                Expr::mul(derive_brut(f, v), (**g).clone()),
                Expr::mul((**f).clone(), derive_brut(g, v)),
            ),
            Expr::pow((**g).clone(), Expr::entier(2)),
        ),

        Pow(f, g) => derive_puissance(f, g, v),

        // (√f)' = f' / (2√f)
        Sqrt(f) => Expr::div(
            derive_brut(f, v),
            Expr::mul(Expr::entier(2), Expr::Sqrt(f.clone())),
        ),

        Sin(f) => Expr::mul(Expr::Cos(f.clone()), derive_brut(f, v)),
        Cos(f) => Expr::mul(Expr::neg(Expr::Sin(f.clone())), derive_brut(f, v)),
        // tan' = 1/cos²
        Tan(f) => Expr::div(
            derive_brut(f, v),
            Expr::pow(Expr::Cos(f.clone()), Expr::entier(2)),
        ),
        Ln(f) => Expr::div(derive_brut(f, v), (**f).clone()),
    }
}

fn derive_puissance(f: &Expr, g: &Expr, v: &str) -> Expr {
    let f_dep = f.contient_var(v);
    let g_dep = g.contient_var(v);

    match (f_dep, g_dep) {
        // (f^n)' = n·f^(n-1)·f'
        (true, false) => Expr::mul(
            Expr::mul(
                g.clone(),
                Expr::pow(f.clone(), Expr::sub(g.clone(), Expr::un())),
            ),
            derive_brut(f, v),
        ),

        // (a^g)' = a^g·ln(a)·g'   (ln e = 1 via canon)
        (false, true) => Expr::mul(
            Expr::mul(Expr::pow(f.clone(), g.clone()), ln_de(f)),
            derive_brut(g, v),
        ),

        // (f^g)' = f^g·(g'·ln f + g·f'/f)
        (true, true) => Expr::mul(
            Expr::pow(f.clone(), g.clone()),
            Expr::add(
                Expr::mul(derive_brut(g, v), ln_de(f)),
                Expr::div(Expr::mul(g.clone(), derive_brut(f, v)), f.clone()),
            ),
        ),

        (false, false) => Expr::zero(),
    }
}

fn ln_de(f: &Expr) -> Expr {
    match f {
        Expr::Const(Constante::E) => Expr::un(),
        autre => Expr::Ln(Box::new(autre.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::rpn::lire_latex;

    fn d(s: &str, v: &str) -> String {
        let e = lire_latex(s).unwrap();
        // e comme nombre d’Euler (la passe d’alias du mode dérivée)
        let e = e.substitue("e", &Expr::Const(Constante::E));
        deriver(&e, v).to_string()
    }

    #[test]
    fn polynomes() {
        assert_eq!(d("x^2", "x"), "2*x");
        assert_eq!(d("x^3 + 5x", "x"), "3*x^2 + 5");
        assert_eq!(d("7", "x"), "0");
        assert_eq!(d("x y", "x"), "y");
    }

    #[test]
    fn quotients_et_inverses() {
        assert_eq!(d("\\frac{1}{x}", "x"), "-1/x^2");
        assert_eq!(d("\\frac{x}{2}", "x"), "1/2");
    }

    #[test]
    fn fonctions() {
        assert_eq!(d("\\sin(x)", "x"), "cos(x)");
        assert_eq!(d("\\cos(x)", "x"), "-sin(x)");
        assert_eq!(d("\\ln(x)", "x"), "1/x");
        assert_eq!(d("e^{x}", "x"), "exp(x)");
        assert_eq!(d("\\exp(2x)", "x"), "2*exp(2*x)");
        assert_eq!(d("\\sqrt{x}", "x"), "1/(2*sqrt(x))");
    }

    #[test]
    fn regle_de_chaine() {
        assert_eq!(d("\\sin(x^2)", "x"), "2*x*cos(x^2)");
    }

    #[test]
    fn autre_variable() {
        assert_eq!(d("x^2", "y"), "0");
    }
}
