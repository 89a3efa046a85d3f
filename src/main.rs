use crsh::config::Config;
use crsh::repl::Shell;
use crsh::signals::install_signal_handlers;

fn main() {
    init_logging();

    if let Err(err) = install_signal_handlers() {
        eprintln!("error: {err}");
        return;
    }

    let config = Config::from_env();
    let mut shell = match Shell::new(config) {
        Ok(shell) => shell,
        Err(err) => {
            eprintln!("error: {err}");
            return;
        }
    };

    loop {
        match shell.run_once() {
            Ok(true) => continue,
            Ok(false) => break,
            Err(err) => eprintln!("error: {err}"),
        }
    }
}

fn init_logging() {
    let env = env_logger::Env::default().filter_or("CRSH_LOG", "info");
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
