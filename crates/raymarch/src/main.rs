mod bootstrap;
mod cli;
mod paths;
mod run;

use std::process::ExitCode;

use renderer::GpuUnavailable;

const GPU_UNAVAILABLE_MESSAGE: &str = "GPU rendering is not supported on this system";

fn main() -> ExitCode {
    let cli = cli::parse();
    run::initialise_tracing();

    match run::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn report(err: &anyhow::Error) {
    if let Some(unavailable) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<GpuUnavailable>())
    {
        tracing::debug!(reason = unavailable.reason(), "GPU unavailable");
        eprintln!("{GPU_UNAVAILABLE_MESSAGE}");
    } else {
        tracing::debug!(error = ?err, "run failed");
        eprintln!("renderer error: {err:#}");
    }
}
