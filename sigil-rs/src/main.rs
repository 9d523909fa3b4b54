use std::sync::atomic::Ordering;

use env_logger::Env;
use log::{debug, warn};

use sigil::cli::{self, CliArgs};
use sigil::config::Settings;
use sigil::console::Console;
use sigil::repl;
use sigil::script::{Interpreter, Outcome};
use sigil::session::Session;

#[tokio::main]
async fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("sigil: {e}");
            eprintln!("{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    let level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    // ── Settings and session ──────────────────────────────────────────────────
    let (mut settings, problems) = Settings::from_env();
    for problem in &problems {
        warn!("ignoring {problem}");
    }
    if let Some(profile) = &args.profile {
        settings.profile = profile.clone();
    }

    let mut session = match Session::new(settings) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("sigil: cannot start session: {e}");
            std::process::exit(1);
        }
    };
    session.persist = !args.no_profile;

    let interactive = unsafe { libc::isatty(libc::STDIN_FILENO) != 0 && libc::isatty(libc::STDOUT_FILENO) != 0 };
    debug!("interactive console: {interactive}");

    // The interpreter holds non-Send state, so it is built on the blocking
    // thread; only the interrupt flag crosses back.
    let (flag_tx, flag_rx) = tokio::sync::oneshot::channel();
    let worker = tokio::task::spawn_blocking(move || {
        let mut interp = Interpreter::new(session, Console::terminal(interactive));
        let _ = flag_tx.send(interp.interrupt_handle());
        run(&mut interp, args)
    });

    if let Ok(flag) = flag_rx.await {
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                flag.store(true, Ordering::SeqCst);
            }
        });
    }

    let code = match worker.await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("sigil: {e}");
            1
        }
    };
    std::process::exit(code);
}

/// Profile, then one of `-c`, a script file, or the REPL.
fn run(interp: &mut Interpreter, args: CliArgs) -> i32 {
    if !args.no_profile {
        if let Outcome::Exit(code) = interp.load_profile() {
            return code;
        }
    }

    if let Some(cmd) = args.command {
        return interp.run_line(&cmd).status();
    }

    if let Some(script) = args.script {
        return match interp.run_file(&script, args.script_args) {
            Ok(outcome) => outcome.status(),
            Err(e) => {
                eprintln!("sigil: {}: {e}", script.display());
                1
            }
        };
    }

    repl::run(interp)
}
