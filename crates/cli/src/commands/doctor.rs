//! `eduguardian doctor`: diagnose provider and search setup.

use eduguardian_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 EduGuardian Doctor");
    println!("=====================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_path();
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ℹ️  No config file, using defaults (run `eduguardian config init`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!();
            println!("  ⚠️  1 issue found. Fix the config file and re-run.");
            return Ok(());
        }
    };

    // LLM provider
    let router = eduguardian_providers::build_from_config(&config);
    match router.default() {
        Some(provider) => match provider.health_check().await {
            Ok(true) => println!(
                "  ✅ Provider '{}' reachable (model {})",
                config.default_provider, config.default_model
            ),
            Ok(false) => {
                println!("  ❌ Provider '{}' rejected the request", config.default_provider);
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider '{}' unreachable: {e}", config.default_provider);
                issues += 1;
            }
        },
        None => {
            println!(
                "  ⚠️  Provider '{}' not configured (set GROQ_API_KEY or EDUGUARDIAN_API_KEY)",
                config.default_provider
            );
            issues += 1;
        }
    }

    // Web search
    match config.search.provider.as_str() {
        "offline" | "mock" => println!("  ℹ️  Search runs offline (canned results)"),
        _ if config.search.api_key.is_some() => {
            println!("  ✅ Search key configured ({})", config.search.provider)
        }
        _ => {
            if config.pipeline.degrade_on_search_failure {
                println!("  ⚠️  No search key: lessons outside local knowledge get no context");
            } else {
                println!("  ❌ No search key and degradation is off: web lessons will fail");
            }
            issues += 1;
        }
    }

    println!("  ✅ Checkpoints: {}", config.checkpoint.backend);

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
