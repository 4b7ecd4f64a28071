// src/main.rs
//
// Évaluateur LaTeX, point d’entrée ligne de commande
// ---------------------------------------------------
//   evaluateur <expr>                      valeur numérique  " = t" / " ≈ t" (sans fin de ligne)
//   evaluateur symbolic <expr>             forme simplifiée  " = m"
//   evaluateur solve <lhs> <rhs> <var>     "var = m" ou "Could not solve for var."
//   evaluateur diff <expr> <symbols> <var> dérivée en texte brut
//
// Codes de sortie :
// - 1 : arguments manquants (usage sur stderr), fichier de réglages invalide
// - 0 : sinon, y compris les erreurs internes à un mode (message sur stderr)
//
// Le journal (tracing) écrit sur stderr uniquement : stdout reste exact.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use evaluateur_latex::config::Reglages;
use evaluateur_latex::noyau::{Commande, ErreurEval, Evaluateur, Sortie};

#[derive(Parser, Debug)]
#[command(name = "evaluateur", version, about = "Évalue une expression LaTeX")]
#[command(
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true,
    allow_negative_numbers = true
)]
struct Cli {
    /// Décimales affichées pour un résultat numérique
    #[arg(short, long, env = "EVALUATEUR_DECIMALES", global = true)]
    decimales: Option<i32>,

    /// Fichier de réglages TOML (decimales, [constantes])
    #[arg(long, value_name = "FICHIER", global = true)]
    config: Option<PathBuf>,

    /// Journal détaillé sur stderr (sauf si RUST_LOG est défini)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    mode: Option<ModeCli>,

    /// Expression à évaluer numériquement
    #[arg(required = true, allow_hyphen_values = true)]
    expr: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ModeCli {
    /// Simplification symbolique
    #[command(allow_negative_numbers = true)]
    Symbolic {
        #[arg(allow_hyphen_values = true)]
        expr: String,
    },

    /// Résolution de lhs = rhs pour var
    #[command(allow_negative_numbers = true)]
    Solve {
        #[arg(allow_hyphen_values = true)]
        lhs: String,
        #[arg(allow_hyphen_values = true)]
        rhs: String,
        #[arg(allow_hyphen_values = true)]
        var: String,
    },

    /// Dérivée de expr par rapport à var
    #[command(allow_negative_numbers = true)]
    Diff {
        #[arg(allow_hyphen_values = true)]
        expr: String,
        /// Symboles pré-déclarés, séparés par des virgules ou des espaces
        #[arg(allow_hyphen_values = true)]
        symbols: String,
        #[arg(allow_hyphen_values = true)]
        var: String,
    },
}

impl Cli {
    fn commande(self) -> Commande {
        match self.mode {
            Some(ModeCli::Symbolic { expr }) => Commande::Symbolique { expr },
            Some(ModeCli::Solve { lhs, rhs, var }) => Commande::Resolution {
                gauche: lhs,
                droite: rhs,
                var,
            },
            Some(ModeCli::Diff { expr, symbols, var }) => Commande::Derivation {
                expr,
                symboles: decouper_symboles(&symbols),
                var,
            },
            None => Commande::Numerique {
                expr: self.expr.unwrap_or_default(),
            },
        }
    }
}

fn decouper_symboles(s: &str) -> Vec<String> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/* ------------------------ Journal ------------------------ */

fn installer_journal(verbose: bool) {
    let defaut = if verbose { "debug" } else { "warn" };
    let filtre = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(defaut));

    // un abonné déjà installé n’est pas une erreur
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filtre)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/* ------------------------ Sortie ------------------------ */

fn imprimer(sortie: &Sortie) {
    let mut out = io::stdout().lock();
    let r = match sortie {
        // pas de fin de ligne en mode numérique
        Sortie::Numerique(_) => write!(out, "{sortie}"),
        _ => writeln!(out, "{sortie}"),
    };
    if r.and_then(|_| out.flush()).is_err() {
        eprintln!("Error: cannot write to stdout");
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    installer_journal(cli.verbose);

    let reglages = match &cli.config {
        Some(chemin) => match Reglages::charger(chemin) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::from(1);
            }
        },
        None => Reglages::default(),
    };
    let config = match reglages.vers_config(cli.decimales) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };
    let evaluateur = Evaluateur::new(config);
    let table = &evaluateur.config().table;
    debug!(
        decimales = evaluateur.config().decimales,
        constantes = ?table.noms().collect::<Vec<_>>(),
        "configuration"
    );

    match evaluateur.dispatch(&cli.commande()) {
        Ok(sortie) => imprimer(&sortie),
        // « pas de solution » est une réponse, pas une panne
        Err(e @ ErreurEval::SansSolution(_)) => println!("{e}"),
        Err(e) => eprintln!("Error: {e}"),
    }

    ExitCode::SUCCESS
}
