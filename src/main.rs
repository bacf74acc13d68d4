use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use vivavoce::media::{MediaBackendConfig, MediaBackendFactory, MediaSource};
use vivavoce::speech::{FixedDelaySpeechDriver, NullSink, SpeechDriver, TtsSpeechDriver};
use vivavoce::{Config, ExchangeApi, HttpExchangeClient, InterviewSession, SessionConfig};

#[derive(Parser, Debug)]
#[command(name = "vivavoce", about = "Proctored interview session controller")]
struct Args {
    /// Role the candidate is interviewing for
    #[arg(long)]
    job_role: String,

    /// Candidate display name
    #[arg(long, default_value = "")]
    candidate_name: String,

    /// Configuration file (without extension)
    #[arg(long, default_value = "config/vivavoce")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("vivavoce v0.1.0");
    info!("Interview server: {}", cfg.server.http_url);

    let chunk_interval = Duration::from_secs(cfg.media.chunk_interval_secs);

    let backend = MediaBackendFactory::create(
        MediaSource::Synthetic,
        MediaBackendConfig {
            chunk_interval,
            ..MediaBackendConfig::default()
        },
    )?;

    let api: Arc<dyn ExchangeApi> = Arc::new(HttpExchangeClient::new(&cfg.server.http_url));

    let speech: Arc<dyn SpeechDriver> = if cfg.speech.tts_enabled {
        Arc::new(TtsSpeechDriver::new(Arc::clone(&api), Arc::new(NullSink)))
    } else {
        Arc::new(FixedDelaySpeechDriver::new(Duration::from_secs(
            cfg.speech.fallback_delay_secs,
        )))
    };

    let session_config = SessionConfig {
        job_role: args.job_role,
        candidate_name: args.candidate_name,
        ws_base_url: Some(cfg.server.ws_url.clone()),
        frame_interval: chunk_interval,
        frame_width: cfg.media.frame_width,
        frame_height: cfg.media.frame_height,
        ..SessionConfig::default()
    };

    let (session, handle) = InterviewSession::begin(session_config, backend, speech, api).await?;

    let view = handle.view();
    println!("Question {}: {}", view.question_number, view.current_question);
    println!("Commands: <enter> = next question, 'tab' = simulate tab switch, 'end' = finish");

    let session_task = tokio::spawn(session.run());

    let operator = handle.clone();
    let input_task = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match line.trim() {
                "end" => {
                    operator.end().await;
                    break;
                }
                "tab" => operator.tab_hidden().await,
                _ => {
                    operator.advance().await;
                    let view = operator.view();
                    if let Some(error) = &view.last_error {
                        warn!("Last action reported: {}", error);
                    }
                }
            }
        }
    });

    // Echo question changes as the session progresses
    let mut watch = handle.watch();
    let echo_task = tokio::spawn(async move {
        let mut last_question = String::new();
        while watch.changed().await.is_ok() {
            let view = watch.borrow().clone();
            if view.current_question != last_question {
                last_question = view.current_question.clone();
                println!("Question {}: {}", view.question_number, view.current_question);
            }
            if !view.active_alerts.is_empty() {
                println!("Proctoring alert: {}", view.active_alerts.join(", "));
            }
        }
    });

    let summary = session_task.await??;
    input_task.abort();
    echo_task.abort();

    println!("Interview over after {} question(s)", summary.questions_reached);
    if let Some(feedback) = summary.final_feedback {
        println!("Final feedback: {}", feedback);
    }
    println!(
        "Proctoring: {} alerts, {} tab switches",
        summary.report.stats.total_alerts, summary.report.tab_switch_count
    );

    Ok(())
}
