//! Dotlink CLI - inspect and run diagram files
//!
//! Usage: dotlink-cli <file.graph> [--json] [--run]

use std::env;
use std::io::{self, BufRead, Write};

use dotlink::{Digraph, GraphData, Machine};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let file = args.iter().skip(1).find(|a| !a.starts_with("--"));
    let json = args.iter().any(|a| a == "--json");
    let run = args.iter().any(|a| a == "--run");

    let Some(file) = file else {
        println!("Dotlink CLI - diagram inspector");
        println!("Usage: dotlink-cli <file.graph> [--json] [--run]");
        println!();
        println!("  --json  dump the parsed rows as JSON");
        println!("  --run   execute the diagram as a state machine,");
        println!("          reading transition tokens from stdin");
        return;
    };

    let data = match GraphData::load(file) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Could not load '{file}': {e}");
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&data.lines) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("JSON encoding failed: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    print_summary(&data);

    if run {
        run_machine(&data);
    }
}

fn print_summary(data: &GraphData) {
    let digraph = Digraph::from_data(data);
    let machine = Machine::compile(data);

    println!("Parsed {} row(s)", data.lines.len());
    println!("  Dots:  {}", digraph.dots.len());
    println!("  Links: {}", digraph.links.len());
    println!();

    println!("Structure:");
    for id in digraph.dots.iter() {
        let id = id as u32;
        let label = digraph.node(id).map_or("", |n| n.label.as_str());
        println!(
            "  {} ({}): out {}, in {}",
            label,
            id,
            digraph.out_degree(id),
            digraph.in_degree(id)
        );
    }
    println!();

    println!("Automaton:");
    for state in machine.states() {
        let marker = if state == machine.current_state() {
            " (entry)"
        } else {
            ""
        };
        println!("  {state}{marker}");
        for (token, target) in machine.transitions_from(state) {
            println!("    --{token}--> {target}");
        }
    }
}

fn run_machine(data: &GraphData) {
    let mut machine = Machine::compile(data);
    if machine.current_state().is_empty() {
        eprintln!("No entry state: no dot label is wrapped in [brackets]");
        std::process::exit(1);
    }

    println!();
    println!("Running from '{}'. One token per line:", machine.current_state());

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        match machine.trigger(line.trim()) {
            dotlink::TriggerOutcome::Moved { from, token, to } => {
                println!("{from} --{token}--> {to}");
            }
            dotlink::TriggerOutcome::Rejected { from, token } => {
                println!("{from} has no transition for '{token}'");
            }
        }
    }
}
