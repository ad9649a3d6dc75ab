//! MedTrack command-line adapter.
//!
//! # Responsibility
//! - Map commands onto `medtrack_core` services over the SQLite store.
//! - Render results as plain text; errors go to stderr with a non-zero exit.

mod console_sink;

use clap::{Parser, Subcommand, ValueEnum};
use console_sink::ConsoleSink;
use log::{error, info};
use medtrack_core::clock::{hhmm, iso_date, suggest_dose_time};
use medtrack_core::{
    init_logging, open_db, AdherenceService, AppConfig, Clock, MedicineDraft, MedicineListQuery,
    MedicineService, MedicineSummary, MedicineType, Member, MemberService, NotificationPermission,
    NotificationSink, ReminderPoller, ReminderService, SlotState, SqliteKeyValueRepository,
    SystemClock, TrackerService,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "medtrack", about = "Household medication tracker", version)]
struct Cli {
    /// SQLite store path (default: ./medtrack.sqlite3)
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    /// Log directory (default: ./logs)
    #[arg(long, value_name = "DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Manage household members
    #[command(subcommand)]
    Member(MemberCmd),
    /// Manage medicines
    #[command(subcommand)]
    Med(MedCmd),
    /// Show today's doses for a member
    Today {
        #[arg(long, value_name = "MEMBER_ID")]
        member: Option<String>,
    },
    /// Mark today's dose as taken
    Take { medicine_id: String, time: String },
    /// Mark today's dose as skipped
    Skip { medicine_id: String, time: String },
    /// Revert today's dose to pending
    Undo { medicine_id: String, time: String },
    /// Show totals and the last seven days for a member
    Tracker {
        #[arg(long, value_name = "MEMBER_ID")]
        member: Option<String>,
    },
    /// Run a single reminder check
    Remind {
        #[arg(long, value_enum, default_value_t = PermissionArg::Granted)]
        notify_permission: PermissionArg,
    },
    /// Poll for reminders until interrupted
    Watch {
        #[arg(long, value_name = "SECS")]
        interval_secs: Option<u64>,
        /// Stop after this many checks
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
        #[arg(long, value_enum, default_value_t = PermissionArg::Granted)]
        notify_permission: PermissionArg,
    },
}

#[derive(Subcommand)]
enum MemberCmd {
    Add {
        name: String,
        #[arg(long, default_value = "")]
        relationship: String,
        #[arg(long)]
        age: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        relationship: Option<String>,
    },
    /// Delete a member and all of their medicines
    Delete { id: String },
    List,
}

#[derive(Subcommand)]
enum MedCmd {
    Add {
        #[arg(long, value_name = "MEMBER_ID")]
        member: Option<String>,
        #[command(flatten)]
        fields: MedFields,
    },
    /// Replace fields of a medicine; omitted flags keep their value
    Edit {
        id: String,
        #[command(flatten)]
        fields: MedFields,
    },
    Delete { id: String },
    Show { id: String },
    List {
        #[arg(long, value_name = "MEMBER_ID")]
        member: Option<String>,
        /// Case-insensitive name filter
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(clap::Args)]
struct MedFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    dosage: Option<String>,
    /// Tablet|Capsule|Syrup|Injection
    #[arg(long = "type", value_name = "TYPE")]
    kind: Option<MedicineType>,
    /// HH:MM dose time, repeatable; `auto` suggests one from the current time
    #[arg(long = "time", value_name = "HH:MM")]
    times: Vec<String>,
    /// YYYY-MM-DD; pass "" to clear
    #[arg(long, value_name = "DATE")]
    start: Option<String>,
    /// YYYY-MM-DD; pass "" to clear
    #[arg(long, value_name = "DATE")]
    end: Option<String>,
    #[arg(long)]
    stock: Option<u32>,
    #[arg(long)]
    notes: Option<String>,
}

impl MedFields {
    fn apply_to(self, draft: &mut MedicineDraft, clock: &impl Clock) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(dosage) = self.dosage {
            draft.dosage = dosage;
        }
        if let Some(kind) = self.kind {
            draft.kind = kind;
        }
        if !self.times.is_empty() {
            let now = clock.now();
            draft.times = self
                .times
                .into_iter()
                .map(|time| {
                    if time.eq_ignore_ascii_case("auto") {
                        suggest_dose_time(&now)
                    } else {
                        time
                    }
                })
                .collect();
        }
        if let Some(start) = self.start {
            draft.start_date = Some(start);
        }
        if let Some(end) = self.end {
            draft.end_date = Some(end);
        }
        if let Some(stock) = self.stock {
            draft.stock_qty = stock;
        }
        if let Some(notes) = self.notes {
            draft.notes = notes;
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PermissionArg {
    Granted,
    Denied,
    Default,
}

impl From<PermissionArg> for NotificationPermission {
    fn from(value: PermissionArg) -> Self {
        match value {
            PermissionArg::Granted => Self::Granted,
            PermissionArg::Denied => Self::Denied,
            PermissionArg::Default => Self::Default,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={}", err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = build_config(&cli)?;
    if let Err(err) = init_logging(&config.log_level, &config.log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }

    let conn = open_db(&config.db_path)?;
    let repo = SqliteKeyValueRepository::new(&conn);
    let clock = SystemClock;

    let members = MemberService::new(repo);
    if let Some(seeded) = members.ensure_default_member()? {
        println!("created default member {} ({})", seeded.name, seeded.id);
    }

    match cli.cmd {
        Cmd::Member(cmd) => run_member(&members, cmd),
        Cmd::Med(cmd) => run_med(&members, &MedicineService::new(repo, clock), cmd, &clock),
        Cmd::Today { member } => {
            let member = resolve_member(&members, member)?;
            let service = AdherenceService::new(repo, clock);
            let doses = service.today(&member.id)?;
            println!("{} for {}", iso_date(clock.today()), member.name);
            if doses.is_empty() {
                println!("no doses scheduled");
            }
            for dose in doses {
                println!(
                    "{}  {:<8} {} {} [{}]",
                    dose.slot.scheduled_time,
                    dose.state.label(),
                    dose.medicine_name,
                    dose.dosage,
                    dose.slot.medicine_id
                );
                if !dose.notes.is_empty() {
                    println!("       {}", dose.notes);
                }
            }
            Ok(())
        }
        Cmd::Take { medicine_id, time } => {
            let event = AdherenceService::new(repo, clock).mark_taken(&medicine_id, &time)?;
            println!(
                "taken: {} {} at {}",
                event.medicine_id,
                event.scheduled_time,
                hhmm(&event.taken_at)
            );
            Ok(())
        }
        Cmd::Skip { medicine_id, time } => {
            let event = AdherenceService::new(repo, clock).mark_skipped(&medicine_id, &time)?;
            println!("skipped: {} {}", event.medicine_id, event.scheduled_time);
            Ok(())
        }
        Cmd::Undo { medicine_id, time } => {
            match AdherenceService::new(repo, clock).undo(&medicine_id, &time)? {
                Some(event) => println!(
                    "undone: {} {} is {} again",
                    event.medicine_id,
                    event.scheduled_time,
                    SlotState::Pending.label().to_ascii_lowercase()
                ),
                None => println!("nothing to undo"),
            }
            Ok(())
        }
        Cmd::Tracker { member } => {
            let member = resolve_member(&members, member)?;
            let summary = TrackerService::new(repo, clock).summary(&member.id)?;
            println!(
                "{}: {} / {} doses taken (last recorded)",
                member.name, summary.taken_total, summary.daily_doses_total
            );
            if summary.days.is_empty() {
                println!("no medicines");
            }
            for day in summary.days {
                println!(
                    "{}  {:>3}%  {}/{}",
                    iso_date(day.date),
                    day.percent,
                    day.taken,
                    day.scheduled
                );
            }
            Ok(())
        }
        Cmd::Remind { notify_permission } => {
            let sink = ConsoleSink::new(notify_permission.into());
            let fired = ReminderService::new(repo, clock).tick(&sink)?;
            if fired.is_empty() {
                println!("no reminders due at {}", hhmm(&clock.now()));
            }
            Ok(())
        }
        Cmd::Watch {
            ticks,
            notify_permission,
            ..
        } => {
            let sink = ConsoleSink::new(notify_permission.into());
            let permission = sink.request_permission();
            let service = ReminderService::new(repo, clock);
            let poller = ReminderPoller::new(config.poll_interval);
            println!(
                "watching for reminders every {}s (notification permission: {})",
                poller.interval().as_secs(),
                permission.as_str()
            );
            let fired = poller.run(&service, &sink, ticks, std::thread::sleep);
            println!("fired {fired} reminder(s)");
            Ok(())
        }
    }
}

fn build_config(cli: &Cli) -> CliResult<AppConfig> {
    let mut config = AppConfig::default();
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = log_dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Cmd::Watch {
        interval_secs: Some(secs),
        ..
    } = &cli.cmd
    {
        config.poll_interval = Duration::from_secs(*secs);
    }
    Ok(config.resolved(&std::env::current_dir()?)?)
}

/// Explicit member, or the first one in the household.
fn resolve_member(
    members: &MemberService<SqliteKeyValueRepository<'_>>,
    requested: Option<String>,
) -> CliResult<Member> {
    match requested {
        Some(id) => members
            .get_member(&id)?
            .ok_or_else(|| format!("member not found: {id}").into()),
        None => members
            .list_members()?
            .into_iter()
            .next()
            .ok_or_else(|| "no members".into()),
    }
}

fn run_member(
    members: &MemberService<SqliteKeyValueRepository<'_>>,
    cmd: MemberCmd,
) -> CliResult<()> {
    match cmd {
        MemberCmd::Add {
            name,
            relationship,
            age,
        } => {
            let member = members.add_member(&name, &relationship, age)?;
            println!("added member {} ({})", member.name, member.id);
        }
        MemberCmd::Edit {
            id,
            name,
            relationship,
        } => {
            let current = members
                .get_member(&id)?
                .ok_or_else(|| format!("member not found: {id}"))?;
            let member = members.update_member(
                &id,
                name.as_deref().unwrap_or(&current.name),
                relationship.as_deref().unwrap_or(&current.relationship),
            )?;
            println!("updated member {} ({})", member.name, member.id);
        }
        MemberCmd::Delete { id } => {
            let deletion = members.delete_member(&id)?;
            println!(
                "deleted member {} and {} medicine(s)",
                deletion.member.name,
                deletion.removed_medicine_ids.len()
            );
        }
        MemberCmd::List => {
            for member in members.list_members()? {
                let age = member.age.as_deref().unwrap_or("-");
                println!(
                    "{}  {} ({}) age {}",
                    member.id, member.name, member.relationship, age
                );
            }
        }
    }
    Ok(())
}

fn run_med(
    members: &MemberService<SqliteKeyValueRepository<'_>>,
    medicines: &MedicineService<SqliteKeyValueRepository<'_>, SystemClock>,
    cmd: MedCmd,
    clock: &SystemClock,
) -> CliResult<()> {
    match cmd {
        MedCmd::Add { member, fields } => {
            let owner = resolve_member(members, member)?;
            let mut draft = MedicineDraft::default();
            fields.apply_to(&mut draft, clock);
            let medicine = medicines.add_medicine(&owner.id, draft)?;
            info!(
                "event=cli_command module=cli status=ok command=med_add medicine_id={}",
                medicine.id
            );
            println!("added medicine {} ({}) for {}", medicine.name, medicine.id, owner.name);
        }
        MedCmd::Edit { id, fields } => {
            let current = medicines
                .get_medicine(&id)?
                .ok_or_else(|| format!("medicine not found: {id}"))?;
            let mut draft = current.medicine.to_draft();
            fields.apply_to(&mut draft, clock);
            let medicine = medicines.update_medicine(&id, draft)?;
            println!("updated medicine {} ({})", medicine.name, medicine.id);
        }
        MedCmd::Delete { id } => {
            let medicine = medicines.delete_medicine(&id)?;
            println!("deleted medicine {} ({})", medicine.name, medicine.id);
        }
        MedCmd::Show { id } => {
            let summary = medicines
                .get_medicine(&id)?
                .ok_or_else(|| format!("medicine not found: {id}"))?;
            print_medicine(&summary, true);
        }
        MedCmd::List { member, search } => {
            let items = medicines.list_medicines(&MedicineListQuery {
                member_id: member,
                name_contains: search,
            })?;
            if items.is_empty() {
                println!("no medicines");
            }
            for item in &items {
                print_medicine(item, false);
            }
        }
    }
    Ok(())
}

fn print_medicine(summary: &MedicineSummary, detailed: bool) {
    let medicine = &summary.medicine;
    println!(
        "{}  {} {} ({}) for {}",
        medicine.id,
        medicine.name,
        medicine.dosage,
        medicine.kind,
        summary.owner_name.as_deref().unwrap_or("?")
    );
    println!(
        "    {} at {} | stock {} | {}",
        summary.frequency_label(),
        medicine.times.join(", "),
        medicine.stock_qty,
        summary.stock_estimate()
    );
    if detailed {
        println!(
            "    from {} to {}",
            medicine.start_date.as_deref().unwrap_or("-"),
            medicine.end_date.as_deref().unwrap_or("-")
        );
        if !medicine.notes.is_empty() {
            println!("    notes: {}", medicine.notes);
        }
    }
}
