use anyhow::{anyhow, Result};
use std::env;

use smart_tutor::config::Config;
use smart_tutor::SpeechService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let ids_only = args.contains(&"--ids-only".to_string());

    let config = Config::from_env()?;
    let speech = SpeechService::from_config(&config.speech)
        .ok_or_else(|| anyhow!("ELEVENLABS_API_KEY is not set"))?;

    let voices = speech.list_voices().await?;

    if ids_only {
        for voice in &voices {
            println!("{}", voice.voice_id);
        }
        return Ok(());
    }

    println!("=== Available Voices ===");
    println!("Found {} voices:", voices.len());
    println!("{}", "-".repeat(50));
    for (i, voice) in voices.iter().enumerate() {
        match &voice.category {
            Some(category) => println!("{}. {} (ID: {}, {})", i + 1, voice.name, voice.voice_id, category),
            None => println!("{}. {} (ID: {})", i + 1, voice.name, voice.voice_id),
        }
    }
    println!("{}", "-".repeat(50));

    match voices.first() {
        Some(voice) if config.speech.voice_id.is_none() => {
            println!("\nThe server will pick '{}' as its default voice.", voice.name);
            println!("Set ELEVENLABS_VOICE_ID to choose a different one.");
        }
        _ => {}
    }

    Ok(())
}
