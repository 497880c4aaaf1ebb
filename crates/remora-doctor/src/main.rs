//! Environment diagnostic: a human-readable report on everything the converter and
//! server need (the Node toolchain, the Mermaid CLI, project directories, and the
//! usual candidate ports). Not machine-consumed.

use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use remora::exec::run_with_timeout;
use remora::{candidates, probe};

const TOOL_TIMEOUT: Duration = Duration::from_secs(10);
const PORT_TIMEOUT: Duration = Duration::from_secs(1);

fn print_header(title: &str) {
    println!();
    println!("{}", "=".repeat(60));
    println!(" {title}");
    println!("{}", "=".repeat(60));
}

fn check_host() {
    print_header("Host");
    println!("remora-doctor {}", env!("CARGO_PKG_VERSION"));
    println!("OS: {} ({})", std::env::consts::OS, std::env::consts::FAMILY);
    println!("Architecture: {}", std::env::consts::ARCH);
    match std::env::current_dir() {
        Ok(dir) => println!("Working directory: {}", dir.display()),
        Err(err) => println!("Working directory: unavailable ({err})"),
    }
}

fn check_tool(name: &str) {
    let mut cmd = Command::new(name);
    cmd.arg("--version");
    match run_with_timeout(cmd, TOOL_TIMEOUT) {
        Ok(outcome) if outcome.success() => {
            println!("[ok] {name}: {}", outcome.stdout.trim());
        }
        Ok(outcome) if outcome.timed_out => println!("[!!] {name}: not responding"),
        Ok(outcome) => println!("[!!] {name}: exited with status {:?}", outcome.status),
        Err(_) => println!("[!!] {name}: not found"),
    }
}

fn check_toolchain() {
    print_header("Node.js Environment");
    check_tool("node");
    check_tool("npm");
}

fn check_mermaid_cli() {
    print_header("Mermaid CLI");

    let root = std::env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf());
    let mut found = None;
    for candidate in candidates(&root) {
        let verdict = probe(&candidate);
        if verdict.usable {
            println!("[ok] {}: usable ({})", candidate.label(), verdict.detail);
            found = Some(candidate);
            break;
        }
        println!("[!!] {}: {}", candidate.label(), verdict.detail);
    }

    match found {
        Some(candidate) => {
            println!();
            println!("Mermaid CLI is available via: {}", candidate.label());
        }
        None => {
            println!();
            println!("Mermaid CLI not detected. Conversions will use placeholder images.");
            println!("To install it:");
            println!("  1. npm install -g @mermaid-js/mermaid-cli");
            println!("  2. or locally: npm install @mermaid-js/mermaid-cli");
        }
    }
}

fn check_project_files() {
    print_header("Project Files");
    for file in ["Cargo.toml", "README.md"] {
        let path = Path::new(file);
        match std::fs::metadata(path) {
            Ok(meta) => println!("[ok] {file} ({} bytes)", meta.len()),
            Err(_) => println!("[!!] {file}: missing"),
        }
    }
}

fn check_directories() {
    print_header("Project Directories");
    for dir in ["uploads", "outputs", "diagrams"] {
        let path = Path::new(dir);
        if path.is_dir() {
            let items = std::fs::read_dir(path).map(|it| it.count()).unwrap_or(0);
            println!("[ok] {dir}/ ({items} items)");
        } else {
            match std::fs::create_dir_all(path) {
                Ok(()) => println!("[ok] {dir}/ (created)"),
                Err(err) => println!("[!!] {dir}/: missing and could not be created ({err})"),
            }
        }
    }
}

fn check_ports() {
    print_header("Network Ports");
    for port in [5000u16, 8000, 3000] {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        // A successful connect means something is already listening there.
        match TcpStream::connect_timeout(&addr, PORT_TIMEOUT) {
            Ok(_) => println!("[!!] port {port}: in use"),
            Err(_) => println!("[ok] port {port}: available"),
        }
    }
}

fn print_recommendations() {
    print_header("Recommendations");
    println!("1. Convert a diagram:      remora-cli -t \"graph TD; A-->B\" -o out.png");
    println!("2. Start the web API:      remora-server   (then open http://localhost:5000)");
    println!("3. Optional real renderer: npm install -g @mermaid-js/mermaid-cli");
}

fn main() {
    println!("remora environment diagnostic");

    check_host();
    check_toolchain();
    check_mermaid_cli();
    check_project_files();
    check_directories();
    check_ports();
    print_recommendations();

    println!();
    println!("{}", "=".repeat(60));
    println!(" Diagnostic complete");
    println!("{}", "=".repeat(60));
}
