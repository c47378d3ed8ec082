//! vmsim - Interactive demand-paging simulator
//!
//! Drives a [`PagingEngine`] from a stdin command loop:
//!
//!   read <address>         - Read from virtual address
//!   write <address> <val>  - Write value to virtual address
//!   mem                    - Display memory map
//!   table                  - Display page table
//!   exit                   - Exit program

use std::io::{self, BufRead, Write as _};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vmsim::paging::translate;
use vmsim::{EngineEvent, PagingEngine};

/// Interactive demand-paged virtual memory simulator
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Words per page
    #[arg(long, default_value_t = 4)]
    page_size: usize,

    /// Number of physical frames
    #[arg(long, default_value_t = 4)]
    frames: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    run(&args)
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut vm = PagingEngine::new(args.page_size, args.frames);
    vm.set_event_sink(render_event);

    print_banner(args);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();
    loop {
        print!("vm> ");
        stdout.flush().context("failed to flush stdout")?;

        let mut line = String::new();
        if input.read_line(&mut line).context("failed to read stdin")? == 0 {
            break; // EOF behaves like exit
        }
        let line = line.trim().to_lowercase();
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match tokens.as_slice() {
            [] => {}
            ["exit"] => break,
            ["read", address] => match address.parse::<i64>() {
                Ok(address) => read_command(&mut vm, address),
                Err(_) => println!("[ERROR] Usage: read <address>"),
            },
            ["read", ..] => println!("[ERROR] Usage: read <address>"),
            ["write", address, value] => match (address.parse::<i64>(), value.parse::<i64>()) {
                (Ok(address), Ok(value)) => write_command(&mut vm, address, value),
                _ => println!("[ERROR] Usage: write <address> <value>"),
            },
            ["write", ..] => println!("[ERROR] Usage: write <address> <value>"),
            ["mem"] => print_memory_map(&vm),
            ["table"] => print_page_table(&vm),
            _ => {
                println!("[ERROR] Unknown command. Try 'read', 'write', 'mem', 'table', or 'exit'.")
            }
        }
    }

    Ok(())
}

fn read_command(vm: &mut PagingEngine, address: i64) {
    match vm.access(address) {
        Ok(value) => {
            if let Ok((page, offset)) = translate(address, vm.page_size()) {
                println!(
                    "[ACCESS] Virtual address {address} -> Page {page}, Offset {offset} = {value}"
                );
            }
        }
        Err(err) => println!("[ERROR] {err}"),
    }
}

fn write_command(vm: &mut PagingEngine, address: i64, value: i64) {
    // The Written event prints the old -> new line.
    if let Err(err) = vm.write(address, value) {
        println!("[ERROR] {err}");
    }
}

fn render_event(event: &EngineEvent) {
    match *event {
        EngineEvent::Hit { page, frame } => {
            println!("[INFO] Page {page} is already in memory (Frame {frame})");
        }
        EngineEvent::Fault { page } => {
            println!("[PAGE FAULT] Page {page} is not in memory");
        }
        EngineEvent::Evicted { page, frame } => {
            println!("[REPLACEMENT] Replacing page {page} (LRU) from frame {frame}");
        }
        EngineEvent::Loaded { page, frame } => {
            println!("[LOAD] Loaded page {page} into frame {frame}");
        }
        EngineEvent::Written { address, old, new } => {
            println!("[WRITE] Virtual address {address}: {old} -> {new}");
        }
    }
}

fn print_banner(args: &Args) {
    println!();
    println!("=== Virtual Memory Simulator ===");
    println!("Page size: {} | Frames: {}", args.page_size, args.frames);
    println!("Commands:");
    println!("  read <address>         - Read from virtual address");
    println!("  write <address> <val>  - Write value to virtual address");
    println!("  mem                    - Display memory map");
    println!("  table                  - Display page table");
    println!("  exit                   - Exit program");
    println!("===============================");
}

fn print_memory_map(vm: &PagingEngine) {
    println!();
    println!("=== Memory Map ===");
    for slot in vm.memory_map() {
        match slot.page {
            Some(page) => println!(
                "Frame {}: Page {} | Data: {:?} | Last Used: {}",
                slot.frame, page.page_number, page.data, page.last_access
            ),
            None => println!("Frame {}: Empty", slot.frame),
        }
    }
    println!(
        "Page Faults: {} / Accesses: {}",
        vm.fault_count(),
        vm.access_count()
    );
    println!("===================");
    println!();
}

fn print_page_table(vm: &PagingEngine) {
    println!();
    println!("=== Page Table ===");
    for page in vm.page_table_snapshot() {
        match page.frame {
            Some(frame) => println!(
                "Page {}: Frame {} | Data: {:?}",
                page.page_number, frame, page.data
            ),
            None => println!(
                "Page {}: Not in memory | Data: {:?}",
                page.page_number, page.data
            ),
        }
    }
    println!("===================");
    println!();
}
