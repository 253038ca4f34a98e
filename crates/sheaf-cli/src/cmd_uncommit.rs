use sheaf_core::{uncommit, PatchName, TargetRef, UncommitRequest};
use sheaf_store::objects::head_distance;
use sheaf_store::{ObjectStore, Workspace};
use std::path::Path;

pub struct UncommitParams<'a> {
    pub repo_root: &'a Path,
    pub names: Vec<String>,
    pub number: Option<i64>,
    pub to: Option<&'a str>,
    pub exclusive: bool,
}

/// `sheaf uncommit [NAMES..] [-n N] [-t REV] [-x]`
pub fn execute(params: &UncommitParams<'_>) -> anyhow::Result<()> {
    let ws = Workspace::discover(params.repo_root)?;
    let created = uncommit_in(&ws, params)?;

    if created.is_empty() {
        println!("Nothing to uncommit");
        return Ok(());
    }
    let series = sheaf_core::SeriesStore::load_series(&ws.stack)?;
    for name in &created {
        let id = series
            .patch_commit(name)
            .map(|c| c.short().to_string())
            .unwrap_or_default();
        println!("+ {name} ({id})");
    }
    println!("Uncommitted {} patch(es)", created.len());
    Ok(())
}

pub(crate) fn uncommit_in(
    ws: &Workspace,
    params: &UncommitParams<'_>,
) -> anyhow::Result<Vec<PatchName>> {
    let to = params
        .to
        .map(|rev| target_ref(&ws.objects, rev))
        .transpose()?;
    let request = UncommitRequest {
        count: params.number,
        to,
        names: params.names.clone(),
        exclusive: params.exclusive,
    };
    let created = uncommit(&ws.objects, &ws.stack, &request, &ws.config.engine_options())?;
    Ok(created)
}

/// HEAD-relative targets are left for the engine to count from the HEAD it
/// reads under the stack lock; everything else names a fixed commit.
fn target_ref(objects: &ObjectStore, rev: &str) -> sheaf_core::Result<TargetRef> {
    match head_distance(rev) {
        Some(back) => Ok(TargetRef::HeadAncestor(back)),
        None => Ok(objects.resolve(rev)?.into()),
    }
}
