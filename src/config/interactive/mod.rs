
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError, EmbeddingConfig, FallbackMode, GateConfig, GateStrategy};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!(
        "{}",
        style("🔧 Curriculum RAG Configuration Setup").bold().cyan()
    );
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Embedding Service").bold().yellow());
    eprintln!("Configure the local embedding service used for indexing and retrieval.");
    eprintln!();

    configure_embedding(&mut config.embedding)?;

    eprintln!();
    eprintln!("{}", style("Admission Gate").bold().yellow());
    eprintln!("Configure how incoming questions are screened before retrieval.");
    eprintln!();

    configure_gate(&mut config.gate)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_embedding_connection(&config.embedding)? {
        eprintln!(
            "{}",
            style("✓ Embedding service connection successful!").green()
        );
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to the embedding service").yellow()
        );
        eprintln!("You can continue, but make sure the service is running before ingesting.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());

        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Embedding Settings:").bold().yellow());
    eprintln!("  Host: {}", style(&config.embedding.host).cyan());
    eprintln!("  Port: {}", style(config.embedding.port).cyan());
    eprintln!("  Model: {}", style(&config.embedding.model).cyan());
    eprintln!("  Batch Size: {}", style(config.embedding.batch_size).cyan());

    eprintln!();
    eprintln!("{}", style("Classifier Settings:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.classifier.base_url).cyan());
    eprintln!("  Model: {}", style(&config.classifier.model).cyan());
    eprintln!(
        "  API Token: {}",
        if config.classifier.api_token.is_some() {
            style("set").green()
        } else {
            style("not set").dim()
        }
    );

    eprintln!();
    eprintln!("{}", style("Gate Settings:").bold().yellow());
    let strategy = match config.gate.strategy {
        GateStrategy::AllowList => "allow-list",
        GateStrategy::Classifier => "classifier",
    };
    let fallback = match config.gate.fallback {
        FallbackMode::Reject => "reject",
        FallbackMode::AllowList => "allow-list",
    };
    eprintln!("  Strategy: {}", style(strategy).cyan());
    eprintln!(
        "  Subjects: {}",
        style(config.gate.subjects.join(", ")).cyan()
    );
    eprintln!(
        "  Educational Threshold: {}",
        style(config.gate.educational_threshold).cyan()
    );
    eprintln!(
        "  Subject Threshold: {}",
        style(config.gate.subject_threshold).cyan()
    );
    eprintln!("  Classifier Fallback: {}", style(fallback).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load_default().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            let base_dir = Config::default_config_dir()?;
            Ok(Config {
                base_dir,
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_embedding(embedding: &mut EmbeddingConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == embedding.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Embedding service protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Embedding service host")
        .default(embedding.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = EmbeddingConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                port: 11434, // Use default port for validation
                model: "test".to_string(),
                batch_size: 32,
            };
            temp_config.validate()?;
            Ok(())
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Embedding service port")
        .default(embedding.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(embedding.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for embedding generation")
        .default(embedding.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 1000 {
                Err("Batch size must be 1000 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    embedding.set_protocol(protocol)?;
    embedding.set_host(host)?;
    embedding.set_port(port)?;
    embedding.set_model(model)?;
    embedding.set_batch_size(batch_size)?;

    Ok(())
}

fn configure_gate(gate: &mut GateConfig) -> Result<()> {
    let strategies = &["classifier", "allow-list"];
    let default_index = match gate.strategy {
        GateStrategy::Classifier => 0,
        GateStrategy::AllowList => 1,
    };

    let strategy_index = Select::new()
        .with_prompt("Gate strategy")
        .default(default_index)
        .items(strategies)
        .interact()?;

    gate.strategy = if strategy_index == 1 {
        GateStrategy::AllowList
    } else {
        GateStrategy::Classifier
    };

    let subjects: String = Input::new()
        .with_prompt("Supported subjects (comma separated)")
        .default(gate.subjects.join(", "))
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.split(',').all(|s| s.trim().is_empty()) {
                Err("At least one subject is required")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    gate.subjects = subjects
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if gate.strategy == GateStrategy::Classifier {
        let threshold: f32 = Input::new()
            .with_prompt("Classification score threshold")
            .default(gate.educational_threshold)
            .validate_with(|input: &f32| -> Result<(), &str> {
                if *input <= 0.0 || *input >= 1.0 {
                    Err("Threshold must be between 0 and 1, exclusive")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;
        gate.educational_threshold = threshold;
        gate.subject_threshold = threshold;

        let fallbacks = &["reject", "allow-list"];
        let default_fallback = match gate.fallback {
            FallbackMode::Reject => 0,
            FallbackMode::AllowList => 1,
        };
        let fallback_index = Select::new()
            .with_prompt("Behavior when the classifier is unavailable")
            .default(default_fallback)
            .items(fallbacks)
            .interact()?;
        gate.fallback = if fallback_index == 1 {
            FallbackMode::AllowList
        } else {
            FallbackMode::Reject
        };
    }

    Ok(())
}

fn test_embedding_connection(embedding: &EmbeddingConfig) -> Result<bool> {
    let url = format!(
        "{}://{}:{}/api/version",
        embedding.protocol, embedding.host, embedding.port
    );

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    match agent.get(&url).call() {
        Ok(_) => Ok(true),
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => Ok(true),
        Err(_) => Ok(false),
    }
}
