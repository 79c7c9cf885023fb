//! healthbuddy - main entry point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use healthbuddy::cli::{Args, Commands, Settings};
use healthbuddy::config::Config;
use healthbuddy::doctor::Doctor;
use healthbuddy::qa::QaHandle;
use healthbuddy::server;
use indicatif::{ProgressBar, ProgressStyle};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("could not load config file: {}", e);
        Config::default()
    });
    let settings = args.settings(&config);

    match &args.command {
        Some(Commands::Doctor) => run_doctor(&settings).await,
        Some(Commands::Config) => show_config(&settings),
        Some(Commands::Serve) | None => run_server(settings).await,
    }
}

async fn run_server(settings: Settings) -> Result<()> {
    let qa = load_model(&settings.model_id).await;

    match qa.unavailable_reason() {
        None => println!("{}", "Model loaded successfully!".green()),
        Some(reason) => {
            eprintln!(
                "{}: could not load model: {}",
                "Warning".yellow(),
                reason
            );
            eprintln!("  Question answering is disabled; reports and tips still work.");
        }
    }

    println!("Serving on http://{}", settings.bind);
    server::serve(settings, qa).await
}

/// Load the QA model with a progress spinner; failures degrade, never abort
async fn load_model(model_id: &str) -> QaHandle {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Loading QA model {}...", model_id));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let model_id = model_id.to_string();
    let qa = tokio::task::spawn_blocking(move || QaHandle::load(&model_id))
        .await
        .unwrap_or_else(|e| QaHandle::unavailable(format!("model load task failed: {}", e)));

    pb.finish_and_clear();
    qa
}

async fn run_doctor(settings: &Settings) -> Result<()> {
    let doctor = Doctor::new(
        settings.model_id.clone(),
        settings.transcribe_url.clone(),
    );

    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    std::process::exit(if Doctor::overall_status(&checks) { 0 } else { 1 });
}

fn show_config(settings: &Settings) -> Result<()> {
    println!("\nhealthbuddy configuration\n");
    println!("Server:");
    println!("  Bind:               {}", settings.bind);
    println!();
    println!("Model:");
    println!("  Checkpoint:         {}", settings.model_id);
    println!();
    println!("Speech:");
    println!("  Transcribe URL:     {}", settings.transcribe_url);
    println!(
        "  Request timeout:    {}s",
        settings.transcribe_timeout.as_secs()
    );
    println!(
        "  Speech threshold:   {:.3}",
        settings.capture.speech_threshold
    );
    println!(
        "  Trailing silence:   {}ms",
        settings.capture.trailing_silence.as_millis()
    );
    println!(
        "  Max utterance:      {}s",
        settings.capture.max_utterance.as_secs()
    );
    println!();
    println!("Config file: {:?}", Config::config_path()?);
    println!();

    Ok(())
}
