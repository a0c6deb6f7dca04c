//! The `bandscore init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("bandscore.toml").exists() {
        println!("bandscore.toml already exists, skipping.");
    } else {
        std::fs::write("bandscore.toml", SAMPLE_CONFIG)?;
        println!("Created bandscore.toml");
    }

    std::fs::create_dir_all("samples")?;
    let example_path = std::path::Path::new("samples/example.toml");
    if example_path.exists() {
        println!("samples/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_SAMPLE_SET)?;
        println!("Created samples/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set OPENAI_API_KEY, or pass --offline to use the rule-based scorer");
    println!("  2. Run: bandscore validate --samples samples/example.toml");
    println!("  3. Run: bandscore batch --samples samples/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# bandscore configuration

# Providers are tried in order; rule_based is always appended as the last resort.
provider_order = ["openai", "rule_based"]
strict_work_type = false
max_retries = 3
retry_delay_ms = 1000
parallelism = 4
output_dir = "./bandscore-results"
# lexicon = "lexicon.toml"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"
model = "gpt-4"
"#;

const EXAMPLE_SAMPLE_SET: &str = r#"[sample_set]
id = "example"
name = "Example Sample Set"
description = "A short essay and a speaking answer to get started"
default_work_type = "essay"
default_task_type = "task2"

[[samples]]
id = "transport_essay"
name = "Public transport essay"
expected_band = 6.0
tags = ["task2"]
content = """
In my opinion, governments should spend more money on public transport than on roads.

Firstly, buses and trains carry many people at once; therefore, they reduce traffic in city centres. Moreover, a significant number of families cannot afford a car, so public transport gives them access to jobs and schools.

However, some people argue that roads are essential for goods and emergency services. Although this is true, a balanced framework would still prioritise shared transport because it benefits the largest number of citizens.

In conclusion, investment in public transport is the fairer and more sustainable choice.
"""

[[samples]]
id = "hometown_speaking"
name = "Describe your hometown"
work_type = "speaking"
tags = ["part2"]
content = """
Well, I come from a small town near the coast. It's quite quiet, um, but in summer it gets really busy because tourists come for the beaches. What I like most is the old harbour, where you can watch the fishing boats in the morning. If I had the chance, I would definitely move back there when I retire.
"""
"#;
