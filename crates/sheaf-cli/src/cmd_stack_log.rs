use sheaf_store::{stack_log, Workspace};
use std::path::Path;

/// `sheaf stack-log [--json] [--verify]`
pub fn execute(repo_root: &Path, json: bool, verify: bool) -> anyhow::Result<()> {
    let ws = Workspace::discover(repo_root)?;
    let entries = stack_log::read_entries(&ws.paths)?;

    if verify {
        match stack_log::verify_chain(&entries) {
            Ok(()) => println!("Stack log OK ({} entries)", entries.len()),
            Err(i) => anyhow::bail!(
                "stack log chain broken at entry {i} ({})",
                entries[i].entry_id
            ),
        }
        return Ok(());
    }

    for entry in &entries {
        if json {
            println!("{}", serde_json::to_string(entry)?);
            continue;
        }
        let top = entry.top.get(..12).unwrap_or(&entry.top);
        println!(
            "#{:<4} {} {:<9} top={top} applied=[{}]",
            entry.generation,
            entry.ts,
            entry.op,
            entry.applied.join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd_record::record_in;
    use crate::cmd_uncommit::{uncommit_in, UncommitParams};

    #[test]
    fn verify_passes_after_transactions() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        record_in(&ws, "one", "1", &[]).unwrap();
        uncommit_in(
            &ws,
            &UncommitParams {
                repo_root: tmp.path(),
                names: vec![],
                number: None,
                to: None,
                exclusive: false,
            },
        )
        .unwrap();

        let entries = stack_log::read_entries(&ws.paths).unwrap();
        let ops: Vec<&str> = entries.iter().map(|e| e.op.as_str()).collect();
        assert_eq!(ops, ["init", "uncommit"]);
        execute(tmp.path(), false, true).unwrap();
        execute(tmp.path(), true, false).unwrap();
    }
}
