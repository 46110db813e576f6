use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use kin_merge::{MergeConfig, MergeEngine, MergeSummary, SlotAlignment};
use kin_store::{Datastore, DatastoreSnapshot, InMemoryDatastore};
use kin_types::{Handle, Person};
use tracing::info;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => MergeConfig::load(path)
            .with_context(|| format!("loading merge config {}", path.display()))?,
        None => MergeConfig::default(),
    };
    let store = Arc::new(open_store(&cli.db)?);
    let format = cli.format;

    match cli.command {
        Command::MergePerson(args) => cmd_merge_person(&cli.db, store, config, args, &format),
        Command::MergeFamily(args) => cmd_merge_family(&cli.db, store, config, args, &format),
        Command::Check => cmd_check(&store, &format),
        Command::Backlinks(args) => cmd_backlinks(&store, args.handle, &format),
        Command::Show(args) => cmd_show(&store, args.handle, &format),
    }
}

fn open_store(path: &Path) -> anyhow::Result<InMemoryDatastore> {
    let snapshot = DatastoreSnapshot::read_from(path)
        .with_context(|| format!("reading datastore {}", path.display()))?;
    Ok(InMemoryDatastore::from_snapshot(snapshot))
}

fn save_store(path: &Path, store: &InMemoryDatastore) -> anyhow::Result<()> {
    store
        .snapshot()?
        .write_to(path)
        .with_context(|| format!("writing datastore {}", path.display()))?;
    info!(path = %path.display(), "datastore saved");
    Ok(())
}

fn cmd_merge_person(
    db: &Path,
    store: Arc<InMemoryDatastore>,
    config: MergeConfig,
    args: MergePersonArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let engine = MergeEngine::new(store.clone(), config);
    if args.dry_run {
        engine.can_merge_persons(args.survivor, args.casualty)?;
        println!("{} Persons can be merged.", "✓".green().bold());
        return Ok(());
    }
    let summary = engine.merge_person(args.survivor, args.casualty)?;
    save_store(db, &store)?;
    print_summary(&summary, format)
}

fn cmd_merge_family(
    db: &Path,
    store: Arc<InMemoryDatastore>,
    config: MergeConfig,
    args: MergeFamilyArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let engine = MergeEngine::new(store.clone(), config);
    if args.dry_run {
        let alignment = if args.crossed {
            engine.can_merge_families_aligned(args.survivor, args.casualty, SlotAlignment::CROSSED)?;
            SlotAlignment::CROSSED
        } else {
            engine.can_merge_families(args.survivor, args.casualty)?
        };
        let pairing = if alignment.is_straight() { "straight" } else { "crossed" };
        println!(
            "{} Families can be merged ({} parent pairing).",
            "✓".green().bold(),
            pairing.cyan()
        );
        return Ok(());
    }
    let summary = if args.crossed {
        engine.merge_family_aligned(args.survivor, args.casualty, SlotAlignment::CROSSED)?
    } else {
        engine.merge_family(args.survivor, args.casualty)?
    };
    save_store(db, &store)?;
    print_summary(&summary, format)
}

fn print_summary(summary: &MergeSummary, format: &OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    println!(
        "{} Merged into {} {}",
        "✓".green().bold(),
        summary.kind,
        summary.survivor.to_string().yellow()
    );
    for p in &summary.persons_merged {
        println!("  {} person {}", "removed:".red(), p);
    }
    for f in &summary.families_collapsed {
        println!("  {} family {}", "removed:".red(), f);
    }
    for f in &summary.families_touched {
        println!("  {} family {}", "updated:".cyan(), f);
    }
    if summary.cascaded() {
        println!("  {}", "cascaded into related records".dimmed());
    }
    Ok(())
}

fn cmd_check(store: &InMemoryDatastore, format: &OutputFormat) -> anyhow::Result<()> {
    let issues = store.check_integrity()?;
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&issues)?);
        return Ok(());
    }
    if issues.is_empty() {
        println!(
            "{} No issues ({} persons, {} families).",
            "✓".green().bold(),
            store.person_count()?,
            store.family_count()?
        );
        return Ok(());
    }
    println!("{} {} issue(s):", "✗".red().bold(), issues.len());
    for issue in &issues {
        println!("  {issue}");
    }
    Ok(())
}

fn cmd_backlinks(store: &InMemoryDatastore, handle: Handle, format: &OutputFormat) -> anyhow::Result<()> {
    let links = store.find_backlink_handles(&handle)?;
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&links)?);
        return Ok(());
    }
    if links.is_empty() {
        println!("Nothing references {}.", handle.to_string().yellow());
    }
    for link in &links {
        println!("  {} {}", link.kind.to_string().cyan(), link.holder);
    }
    Ok(())
}

fn cmd_show(store: &InMemoryDatastore, handle: Handle, format: &OutputFormat) -> anyhow::Result<()> {
    let json = matches!(format, OutputFormat::Json);
    if let Some(person) = store.get_person(&handle)? {
        if json {
            println!("{}", serde_json::to_string_pretty(&person)?);
        } else {
            println!("{} {}", "person".cyan(), describe_person(&person));
            for fh in &person.family_list {
                println!("  spouse in {}", describe_family(store, fh)?);
            }
            for fh in &person.parent_family_list {
                println!("  child of {}", describe_family(store, fh)?);
            }
        }
    } else if let Some(family) = store.get_family(&handle)? {
        if json {
            println!("{}", serde_json::to_string_pretty(&family)?);
        } else {
            println!("{} {}", "family".cyan(), describe_family(store, &handle)?);
            for child in family.child_handles() {
                println!("  child {}", describe_handle(store, &child)?);
            }
        }
    } else if store.is_retired(&handle)? {
        anyhow::bail!("{handle} was removed");
    } else {
        anyhow::bail!("no person or family with handle {handle}");
    }
    Ok(())
}

fn describe_person(person: &Person) -> String {
    let name = person.primary_name.display();
    if name.is_empty() {
        person.id.clone()
    } else {
        format!("{} {}", person.id, name)
    }
}

fn describe_handle(store: &InMemoryDatastore, handle: &Handle) -> anyhow::Result<String> {
    Ok(match store.get_person(handle)? {
        Some(person) => describe_person(&person),
        None => handle.to_string(),
    })
}

/// "F1 (John Smith & Mary Jones)", with "-" for an empty parent slot.
fn describe_family(store: &InMemoryDatastore, handle: &Handle) -> anyhow::Result<String> {
    let Some(family) = store.get_family(handle)? else {
        return Ok(handle.to_string());
    };
    let mut parents = Vec::new();
    for parent in [family.father, family.mother] {
        parents.push(match parent {
            Some(h) => match store.get_person(&h)? {
                Some(person) => person.primary_name.display(),
                None => h.to_string(),
            },
            None => "-".to_string(),
        });
    }
    Ok(format!("{} ({})", family.id, parents.join(" & ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use kin_types::{Family, Name};

    /// Two fathers of the same mother, written to a temp file.
    fn seed(dir: &Path) -> (std::path::PathBuf, Handle, Handle, Handle, Handle) {
        let mut p1 = Person::new("I1", Name::new("John", "Smith"));
        let mut p2 = Person::new("I2", Name::new("Jon", "Smith"));
        let mut m = Person::new("I3", Name::new("Mary", "Jones"));
        let mut f1 = Family::new("F1");
        let mut f2 = Family::new("F2");
        f1.father = Some(p1.handle);
        f1.mother = Some(m.handle);
        f2.father = Some(p2.handle);
        f2.mother = Some(m.handle);
        p1.add_family_handle(f1.handle);
        p2.add_family_handle(f2.handle);
        m.add_family_handle(f1.handle);
        m.add_family_handle(f2.handle);

        let (h1, h2, fh1, fh2) = (p1.handle, p2.handle, f1.handle, f2.handle);
        let mut snap = DatastoreSnapshot::default();
        for p in [p1, p2, m] {
            snap.persons.insert(p.handle, p);
        }
        for f in [f1, f2] {
            snap.families.insert(f.handle, f);
        }
        let path = dir.join("tree.json");
        snap.write_to(&path).unwrap();
        (path, h1, h2, fh1, fh2)
    }

    fn run(args: &[&str]) -> anyhow::Result<()> {
        run_command(Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn merge_person_writes_back() {
        let dir = tempfile::tempdir().unwrap();
        let (path, p1, p2, _, f2) = seed(dir.path());
        let db = path.to_str().unwrap();

        run(&["kin", "--db", db, "merge-person", &p1.to_string(), &p2.to_string()]).unwrap();

        let snap = DatastoreSnapshot::read_from(&path).unwrap();
        assert!(!snap.persons.contains_key(&p2));
        assert!(!snap.families.contains_key(&f2));
        assert!(snap.retired.contains(&p2));
        assert!(snap.retired.contains(&f2));
    }

    #[test]
    fn dry_run_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let (path, _, _, f1, f2) = seed(dir.path());
        let before = std::fs::read_to_string(&path).unwrap();
        let db = path.to_str().unwrap();

        run(&["kin", "--db", db, "merge-family", &f1.to_string(), &f2.to_string(), "--dry-run"])
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn spouse_merge_fails_and_file_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let (path, p1, _, f1, _) = seed(dir.path());
        let snap = DatastoreSnapshot::read_from(&path).unwrap();
        let mother = snap.families[&f1].mother.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();
        let db = path.to_str().unwrap();

        let err = run(&["kin", "--db", db, "merge-person", &p1.to_string(), &mother.to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("spouses"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn config_file_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let (path, p1, p2, _, f2) = seed(dir.path());
        let config = dir.path().join("merge.toml");
        std::fs::write(&config, "collapse_duplicate_families = false\n").unwrap();
        let db = path.to_str().unwrap();

        run(&[
            "kin",
            "--db",
            db,
            "--config",
            config.to_str().unwrap(),
            "merge-person",
            &p1.to_string(),
            &p2.to_string(),
        ])
        .unwrap();
        let snap = DatastoreSnapshot::read_from(&path).unwrap();
        assert!(snap.families.contains_key(&f2));
    }

    #[test]
    fn read_only_commands_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let (path, p1, _, f1, _) = seed(dir.path());
        let db = path.to_str().unwrap();

        run(&["kin", "--db", db, "check"]).unwrap();
        run(&["kin", "--db", db, "--format", "json", "backlinks", &f1.to_string()]).unwrap();
        run(&["kin", "--db", db, "show", &p1.to_string()]).unwrap();
        assert!(run(&["kin", "--db", db, "show", &Handle::new().to_string()]).is_err());
    }

    #[test]
    fn show_describes_records_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let (path, p1, _, f1, _) = seed(dir.path());
        let store = open_store(&path).unwrap();

        let john = store.get_person(&p1).unwrap().unwrap();
        assert_eq!(describe_person(&john), "I1 John Smith");
        assert_eq!(describe_family(&store, &f1).unwrap(), "F1 (John Smith & Mary Jones)");
        let missing = Handle::new();
        assert_eq!(describe_family(&store, &missing).unwrap(), missing.to_string());
        cmd_show(&store, f1, &OutputFormat::Text).unwrap();
    }

    #[test]
    fn merge_summary_prints_in_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let (path, p1, p2, _, _) = seed(dir.path());
        let store = Arc::new(open_store(&path).unwrap());
        let engine = MergeEngine::with_defaults(store);

        let summary = engine.merge_person(p1, p2).unwrap();
        assert!(summary.cascaded());
        print_summary(&summary, &OutputFormat::Text).unwrap();
        print_summary(&summary, &OutputFormat::Json).unwrap();
    }

    #[test]
    fn missing_db_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("absent.json");
        assert!(run(&["kin", "--db", db.to_str().unwrap(), "check"]).is_err());
    }
}
