//! Headless mode for the tour.
//!
//! A simple line protocol: lines starting with `#` are commands, a bare
//! number scans that object id, and any other text is kept as a chat recap.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use wakes_core::{
    ClaudeNarrator, FileStorage, Narrator, ObjectId, PathId, Register, ScanOutcome, SessionError,
    SilentNarrator, TourConfig, TourSession,
};

/// Command line configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub catalog: PathBuf,
    pub state_dir: PathBuf,
    pub path: Option<PathId>,
    pub register: Option<Register>,
    pub seed: Option<u64>,
    pub model: Option<String>,
    /// Arguments that were not understood.
    pub ignored: Vec<String>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("data/egyptian-art.json"),
            state_dir: PathBuf::from(".wakes"),
            path: None,
            register: None,
            seed: None,
            model: None,
            ignored: Vec::new(),
        }
    }
}

/// Parse configuration from command line arguments.
///
/// `args[0]` is the program name. Unknown flags and unparseable values
/// are ignored with a warning.
pub fn parse_config_from_args(args: &[String]) -> HeadlessConfig {
    let mut config = HeadlessConfig::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--catalog", Some(v)) => {
                config.catalog = PathBuf::from(v);
                i += 1;
            }
            ("--state-dir", Some(v)) => {
                config.state_dir = PathBuf::from(v);
                i += 1;
            }
            ("--path", Some(v)) => {
                match v.parse() {
                    Ok(path) => config.path = Some(path),
                    Err(e) => tracing::warn!(error = %e, "ignoring --path"),
                }
                i += 1;
            }
            ("--register", Some(v)) => {
                match v.parse() {
                    Ok(register) => config.register = Some(register),
                    Err(e) => tracing::warn!(error = %e, "ignoring --register"),
                }
                i += 1;
            }
            ("--model", Some(v)) => {
                config.model = Some(v.clone());
                i += 1;
            }
            ("--seed", Some(v)) => {
                match v.parse() {
                    Ok(seed) => config.seed = Some(seed),
                    Err(e) => tracing::warn!(error = %e, "ignoring --seed"),
                }
                i += 1;
            }
            (arg, _) => {
                tracing::warn!(arg, "ignoring unknown argument");
                config.ignored.push(arg.to_string());
            }
        }
        i += 1;
    }

    config
}

fn narrator(model: Option<&str>) -> Box<dyn Narrator> {
    match ClaudeNarrator::from_env() {
        Ok(claude) => match model {
            Some(model) => Box::new(claude.with_model(model)),
            None => Box::new(claude),
        },
        Err(e) => {
            tracing::warn!(error = %e, "narrating with fallback text only");
            Box::new(SilentNarrator)
        }
    }
}

/// Run the tour in headless mode.
pub async fn run_headless(config: HeadlessConfig) -> Result<(), SessionError> {
    if !config.ignored.is_empty() {
        println!("[CONFIG] Ignored arguments: {}", config.ignored.join(" "));
    }
    let mut tour_config = TourConfig::new();
    if let Some(seed) = config.seed {
        tour_config = tour_config.with_seed(seed);
    }
    if let Some(model) = &config.model {
        tour_config = tour_config.with_model(model);
    }
    let storage = Box::new(FileStorage::new(config.state_dir.clone()));
    let mut session = TourSession::open(&config.catalog, storage, tour_config).await?;
    let narrator = narrator(session.config().model.as_deref());

    println!("=== Museum Wakes ===");
    println!("Catalog: {} objects", session.catalog().len());
    if let Some(register) = config.register {
        session.set_register(register);
    }
    match config.path {
        Some(path) => select_path(&mut session, narrator.as_ref(), path).await,
        None => match session.path() {
            Some(path) => println!("Resuming {}", path.definition().name),
            None => {
                session.begin_path_select();
                println!("Choose a path with #path <search|trial|letters|memory|awakening>");
            }
        },
    }
    println!("Type #help for commands.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('#') {
            let parts: Vec<&str> = command.split_whitespace().collect();
            match (parts.first().copied(), parts.get(1).copied()) {
                (Some("quit") | Some("exit"), _) => {
                    println!("Goodbye!");
                    break;
                }
                (Some("path"), Some(name)) => match name.parse() {
                    Ok(path) => select_path(&mut session, narrator.as_ref(), path).await,
                    Err(e) => println!("[ERROR] {e}"),
                },
                (Some("register"), Some(name)) => match name.parse::<Register>() {
                    Ok(register) => {
                        session.set_register(register);
                        println!("[REGISTER] {register}");
                    }
                    Err(e) => println!("[ERROR] {e}"),
                },
                (Some("scan"), Some(id)) => match id.parse() {
                    Ok(id) => scan(&mut session, narrator.as_ref(), id).await,
                    Err(_) => println!("[ERROR] Usage: #scan <object id>"),
                },
                (Some("next"), _) => match session.next_target() {
                    Some(target) => println!(
                        "[NEXT] {} \"{}\" (Gallery {})",
                        target.artifact.object_id,
                        target.artifact.title,
                        target.artifact.gallery_label()
                    ),
                    None => println!("[NEXT] No targets remain. Explore freely."),
                },
                (Some("targets"), _) => {
                    println!("[TARGETS]");
                    for target in session.targets() {
                        let id = target.artifact.object_id;
                        let mark = if session.sampler().is_scanned(id) { "x" } else { " " };
                        println!(
                            "  [{mark}] {id} \"{}\" [{}]",
                            target.artifact.title,
                            target.role.label()
                        );
                    }
                }
                (Some("status"), _) => print_status(&session),
                (Some("summary"), _) => println!("[SUMMARY] {}", session.journey_summary()),
                (Some("advance"), _) => match session.advance_act() {
                    Ok(Some(act)) => println!("[ACT] {act}"),
                    Ok(None) => println!("[ACT] No transition pending."),
                    Err(e) => println!("[ERROR] {e}"),
                },
                (Some("converge"), _) => {
                    if session.state().convergence_ready {
                        match session.narrate_convergence(narrator.as_ref()).await {
                            Ok(text) => print_narration("GUIDE", &text),
                            Err(e) => println!("[ERROR] {e}"),
                        }
                    } else {
                        println!("[CONVERGE] The story is not ready to end yet.");
                    }
                }
                (Some("epilogue"), _) => {
                    session.finish_epilogue();
                    println!("[EPILOGUE] The tour is complete.");
                }
                (Some("export"), Some(path)) => match session.export(path).await {
                    Ok(()) => println!("[SAVED] Session exported to {path}"),
                    Err(e) => println!("[ERROR] Export failed: {e}"),
                },
                (Some("import"), Some(path)) => match session.import(path).await {
                    Ok(()) => {
                        println!("[LOADED] Session imported from {path}");
                        print_status(&session);
                    }
                    Err(e) => println!("[ERROR] Import failed: {e}"),
                },
                (Some("reset"), _) => {
                    session.reset();
                    println!("[RESET] Session cleared.");
                }
                (Some("help"), _) => print_commands(),
                _ => println!("[ERROR] Unknown command. Type #help for help."),
            }
            stdout.flush().ok();
            continue;
        }

        match line.parse::<ObjectId>() {
            Ok(id) => scan(&mut session, narrator.as_ref(), id).await,
            Err(_) => {
                session.add_chat_moment(line);
                println!("[NOTED]");
            }
        }
        stdout.flush().ok();
    }

    Ok(())
}

async fn select_path(session: &mut TourSession, narrator: &dyn Narrator, path: PathId) {
    let count = session.select_path(path).len();
    let definition = path.definition();
    println!("[PATH] {} - guided by {}", definition.name, definition.guide);
    if count == 0 {
        println!("[PATH] No artifacts in the catalog fit this path. Explore freely.");
    } else {
        println!("[PATH] {count} artifacts await.");
    }
    match session.narrate_intro(narrator).await {
        Ok(text) => print_narration("GUIDE", &text),
        Err(e) => println!("[ERROR] {e}"),
    }
}

async fn scan(session: &mut TourSession, narrator: &dyn Narrator, id: ObjectId) {
    match session.scan(id, narrator).await {
        Ok(ScanOutcome::Recorded {
            beat,
            narration,
            superseded,
            act_transition,
            convergence_ready,
            ..
        }) => {
            let kind = if beat.is_target { "target" } else { "artifact" };
            println!("[SCAN] \"{}\" ({kind}, {})", beat.artifact_title, beat.beat_type);
            if !superseded {
                print_narration("GUIDE", &narration);
            }
            if let Some(act) = act_transition {
                match session.advance_act() {
                    Ok(_) => println!("[ACT] {act}"),
                    Err(e) => println!("[ERROR] {e}"),
                }
            }
            if convergence_ready {
                println!("[CONVERGE] The story can end. Type #converge when ready.");
            }
        }
        Ok(ScanOutcome::Duplicate { object_id }) => {
            println!("[SCAN] {object_id} was already scanned.");
        }
        Ok(ScanOutcome::Stale { .. }) => {
            println!("[SCAN] The session changed before narration arrived.");
        }
        Err(e) => println!("[ERROR] {e}"),
    }
}

fn print_narration(speaker: &str, text: &str) {
    println!("[{speaker}]");
    for para in text.split("\n\n") {
        println!("{para}");
    }
    println!();
}

fn print_status(session: &TourSession) {
    let progress = session.progress();
    println!("[STATUS]");
    println!(
        "  Path: {}",
        if progress.path_name.is_empty() { "none" } else { progress.path_name }
    );
    println!("  Phase: {}", progress.phase.as_str());
    println!("  {} - guide is {}", progress.act, progress.guide_state);
    println!("  Tension: {}/100", progress.tension_level);
    println!(
        "  Scanned: {} (minimum {}, target {}, {}%)",
        progress.scanned, progress.min, progress.target, progress.percentage
    );
    println!(
        "  Targets found: {}/{}",
        session.sampler().scanned_count(),
        session.targets().len()
    );
    if let Some(link) = session.state().clue_chain.current() {
        println!("  Following: \"{}\"", link.target_title);
    }
    println!("  Convergence ready: {}", progress.convergence_ready);
}

fn print_commands() {
    println!("[HELP]");
    println!("  #path <name>     - Choose a path and sample its targets");
    println!("  #register <reg>  - Set the audience register");
    println!("  #scan <id>       - Scan an artifact (a bare number works too)");
    println!("  #next            - Show the next unfound target");
    println!("  #targets         - List this session's targets");
    println!("  #status          - Show progress");
    println!("  #summary         - Show the journey summary");
    println!("  #advance         - Enter the pending act");
    println!("  #converge        - Narrate the ending once ready");
    println!("  #epilogue        - Close the tour");
    println!("  #export <file>   - Save the session to a file");
    println!("  #import <file>   - Load a session from a file");
    println!("  #reset           - Clear the session");
    println!("  #quit            - Exit");
    println!("  (any other text is kept as a chat recap)");
}
