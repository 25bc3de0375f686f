mod watch;

use std::path::PathBuf;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::cli::sink::ConsoleSink;
use crate::io::config_io;
use crate::io::recovery;
use crate::model::config::Config;
use crate::model::task::{local_now, Category, Priority};
use crate::ops::scheduler::DueSoonSweep;
use crate::ops::search;
use crate::ops::store::TaskStore;
use crate::parse::{contains_delimiter, parse_due_input, DISPLAY_FORMAT, FIELD_DELIMITER};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Resolved locations and settings shared by every command
pub(crate) struct Context {
    pub config: Config,
    pub data_file: PathBuf,
    pub json: bool,
}

impl Context {
    fn from_cli(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let data_dir = match cli.dir {
            Some(ref dir) => std::fs::canonicalize(dir)
                .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
            None => std::env::current_dir()?,
        };
        let config_path = cli.config.as_ref().map(PathBuf::from);
        let config = config_io::read_config(config_path.as_deref(), &data_dir)?;
        let data_file = match cli.file {
            Some(ref file) => PathBuf::from(file),
            None => config_io::resolve_data_file(&config, &data_dir),
        };
        tracing::debug!(file = %data_file.display(), "using data file");
        Ok(Context {
            config,
            data_file,
            json: cli.json,
        })
    }

    fn open_store(&self) -> TaskStore {
        TaskStore::open(&self.data_file)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let ctx = Context::from_cli(&cli)?;

    match cli.command {
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::List(args) => cmd_list(&ctx, args),
        Commands::Urgent(args) => cmd_urgent(&ctx, args),
        Commands::Delete(args) => cmd_delete(&ctx, args),
        Commands::Search(args) => cmd_search(&ctx, args),
        Commands::Remind => cmd_remind(&ctx),
        Commands::Watch(args) => watch::cmd_watch(&ctx, args),
        Commands::Recovery(args) => cmd_recovery(&ctx, args),
    }
}

fn parse_category(s: &str) -> Result<Category, Box<dyn std::error::Error>> {
    s.parse::<Category>().map_err(Box::<dyn std::error::Error>::from)
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> CmdResult {
    let due = parse_due_input(&args.due)
        .ok_or_else(|| format!("invalid due date '{}' (use YYYY-MM-DD HH:MM)", args.due))?;
    let priority = args
        .priority
        .parse::<Priority>()
        .map_err(Box::<dyn std::error::Error>::from)?;
    let category = parse_category(&args.category)?;
    if contains_delimiter(&args.description) {
        return Err(format!("description cannot contain '{}'", FIELD_DELIMITER).into());
    }

    let store = ctx.open_store();
    let task = store.add_task(&args.description, due, priority, category)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&task_to_json(&task))?);
    } else {
        println!("Added {}", format_task_line(&task));
    }
    Ok(())
}

fn cmd_list(ctx: &Context, args: ListArgs) -> CmdResult {
    let category = args.category.as_deref().map(parse_category).transpose()?;
    let store = ctx.open_store();
    let (title, tasks) = match category {
        None => ("ALL TASKS", store.list()),
        Some(Category::Work) => ("WORK TASKS", store.list_by_category(Category::Work)),
        Some(Category::Personal) => (
            "PERSONAL TASKS",
            store.list_by_category(Category::Personal),
        ),
    };

    if ctx.json {
        let out: Vec<TaskJson> = tasks.iter().map(task_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_lines(&format_task_table(title, &tasks, "No tasks."));
    }
    Ok(())
}

fn cmd_urgent(ctx: &Context, args: UrgentArgs) -> CmdResult {
    let queries = &ctx.config.queries;
    let horizon = match args.within {
        Some(minutes) if minutes <= 0 => {
            return Err("--within must be a positive number of minutes".into());
        }
        Some(minutes) => chrono::Duration::minutes(minutes),
        None if args.imminent => queries.imminent_horizon(),
        None => queries.urgent_horizon(),
    };

    let store = ctx.open_store();
    let tasks = store.list_urgent(local_now(), horizon);

    if ctx.json {
        let out: Vec<TaskJson> = tasks.iter().map(task_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let title = format!("URGENT TASKS (DUE IN {})", describe_horizon(horizon));
        print_lines(&format_task_table(&title, &tasks, "No urgent tasks."));
    }
    Ok(())
}

fn describe_horizon(horizon: chrono::Duration) -> String {
    let minutes = horizon.num_minutes();
    if minutes % 60 == 0 {
        let hours = minutes / 60;
        format!("{} HOUR{}", hours, if hours == 1 { "" } else { "S" })
    } else {
        format!("{} MINUTE{}", minutes, if minutes == 1 { "" } else { "S" })
    }
}

fn cmd_delete(ctx: &Context, args: DeleteArgs) -> CmdResult {
    let store = ctx.open_store();
    let deleted = store.delete(args.id);

    if ctx.json {
        let out = DeleteJson {
            id: args.id,
            deleted,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    if !deleted {
        return Err(format!("task not found: {}", args.id).into());
    }
    println!("Deleted task #{}", args.id);
    Ok(())
}

fn cmd_search(ctx: &Context, args: SearchArgs) -> CmdResult {
    let re = search::build_regex(&args.pattern)
        .map_err(|e| format!("invalid pattern '{}': {}", args.pattern, e))?;
    let store = ctx.open_store();
    let hits = search::search_tasks(&store.list(), &re);

    if ctx.json {
        let out: Vec<SearchHitJson> = hits.iter().map(hit_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let tasks: Vec<_> = hits.into_iter().map(|h| h.task).collect();
        let title = format!("MATCHES FOR /{}/", args.pattern);
        print_lines(&format_task_table(&title, &tasks, "No matching tasks."));
    }
    Ok(())
}

fn cmd_remind(ctx: &Context) -> CmdResult {
    let store = ctx.open_store();
    let sink = ConsoleSink::new(ctx.json);
    let window = ctx.config.reminders.early_warning_window();
    let mut sweep = DueSoonSweep::new(window);
    let emitted = sweep.run(&store, &sink, local_now());

    if emitted == 0 && !ctx.json {
        println!(
            "Nothing due within {} minutes (checked {}).",
            window.num_minutes(),
            local_now().format(DISPLAY_FORMAT)
        );
    }
    Ok(())
}

fn cmd_recovery(ctx: &Context, args: RecoveryArgs) -> CmdResult {
    if args.clear {
        let removed = recovery::clear_recovery(&ctx.data_file)?;
        println!("Removed {} recovery entries", removed);
        return Ok(());
    }

    let entries = recovery::read_recovery_entries(&ctx.data_file, Some(args.limit));
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("Recovery log is empty.");
    } else {
        for entry in &entries {
            print_lines(&format_recovery_entry(entry));
        }
    }
    Ok(())
}
