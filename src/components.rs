//! Component registry and installer staging, spec §3 / §4.F.
//!
//! Installer scripts are opaque: we only extract them and synthesize a
//! driver that runs them in dependency order (design note §9).

use std::collections::{BTreeSet, VecDeque};
use std::path::Path;

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentId {
    Claude,
    ClaudeFlow,
    GithubCli,
}

impl ComponentId {
    pub fn id(&self) -> &'static str {
        match self {
            ComponentId::Claude => "claude",
            ComponentId::ClaudeFlow => "claude-flow",
            ComponentId::GithubCli => "github-cli",
        }
    }

    pub fn from_id(s: &str) -> eyre::Result<Self> {
        match s {
            "claude" => Ok(ComponentId::Claude),
            "claude-flow" => Ok(ComponentId::ClaudeFlow),
            "github-cli" => Ok(ComponentId::GithubCli),
            other => Err(EngineError::InvalidInput(format!("unknown component: {other}")).into()),
        }
    }
}

pub struct Component {
    pub id: ComponentId,
    pub name: &'static str,
    pub description: &'static str,
    pub emoji: &'static str,
    pub selected_by_default: bool,
    pub installer_script: &'static str,
    pub depends_on: &'static [ComponentId],
    pub requires: &'static [&'static str],
}

/// The embedded installer scripts. These are opaque to the core: we never
/// interpret their contents, only extract and schedule them.
const CLAUDE_SH: &str = include_str!("installers/claude.sh");
const CLAUDE_FLOW_SH: &str = include_str!("installers/claude-flow.sh");
const GITHUB_CLI_SH: &str = include_str!("installers/github-cli.sh");

pub const REGISTRY: &[Component] = &[
    Component {
        id: ComponentId::Claude,
        name: "Claude Code",
        description: "AI coding assistant",
        emoji: "🤖",
        selected_by_default: true,
        installer_script: CLAUDE_SH,
        depends_on: &[],
        requires: &["node"],
    },
    Component {
        id: ComponentId::ClaudeFlow,
        name: "Claude Flow",
        description: "Multi-agent orchestration on top of Claude Code",
        emoji: "🌊",
        selected_by_default: false,
        installer_script: CLAUDE_FLOW_SH,
        depends_on: &[ComponentId::Claude],
        requires: &["node"],
    },
    Component {
        id: ComponentId::GithubCli,
        name: "GitHub CLI",
        description: "gh, for working with pull requests and issues",
        emoji: "🐙",
        selected_by_default: false,
        installer_script: GITHUB_CLI_SH,
        depends_on: &[],
        requires: &[],
    },
];

pub fn find(id: ComponentId) -> &'static Component {
    REGISTRY
        .iter()
        .find(|c| c.id == id)
        .expect("REGISTRY is exhaustive over ComponentId")
}

/// Union of `requires[]` across the given selection, deduplicated.
pub fn system_requirements(selection: &BTreeSet<ComponentId>) -> Vec<&'static str> {
    let mut reqs: BTreeSet<&'static str> = BTreeSet::new();
    for id in selection {
        reqs.extend(find(*id).requires);
    }
    reqs.into_iter().collect()
}

/// Order `selection` so every component's `depends_on` precede it
/// (Kahn's algorithm). The registry is a small fixed set, so a cycle can
/// only be a programming error in `REGISTRY` itself.
fn dependency_order(selection: &BTreeSet<ComponentId>) -> eyre::Result<Vec<ComponentId>> {
    let mut in_degree: std::collections::BTreeMap<ComponentId, usize> =
        selection.iter().map(|id| (*id, 0)).collect();
    let mut dependents: std::collections::BTreeMap<ComponentId, Vec<ComponentId>> =
        selection.iter().map(|id| (*id, Vec::new())).collect();

    for id in selection {
        for dep in find(*id).depends_on {
            if selection.contains(dep) {
                *in_degree.get_mut(id).unwrap() += 1;
                dependents.get_mut(dep).unwrap().push(*id);
            }
        }
    }

    let mut queue: VecDeque<ComponentId> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut ordered = Vec::with_capacity(selection.len());

    while let Some(id) = queue.pop_front() {
        ordered.push(id);
        for dependent in &dependents[&id] {
            let deg = in_degree.get_mut(dependent).unwrap();
            *deg -= 1;
            if *deg == 0 {
                queue.push_back(*dependent);
            }
        }
    }

    if ordered.len() != selection.len() {
        return Err(EngineError::Internal("component dependency cycle detected".to_string()).into());
    }
    Ok(ordered)
}

/// Extract installer scripts into `<codespace>/components/<id>.sh` (mode
/// 0755) and synthesize `<codespace>/init/init.sh`, which runs them in
/// dependency order on first container start.
pub fn stage(codespace_dir: &Path, selection: &BTreeSet<ComponentId>) -> eyre::Result<()> {
    if selection.is_empty() {
        return Ok(());
    }

    let components_dir = codespace_dir.join("components");
    let init_dir = codespace_dir.join("init");
    std::fs::create_dir_all(&components_dir)?;
    std::fs::create_dir_all(&init_dir)?;

    for id in selection {
        let component = find(*id);
        let path = components_dir.join(format!("{}.sh", component.id.id()));
        std::fs::write(&path, component.installer_script)?;
        set_executable(&path)?;
    }

    let ordered = dependency_order(selection)?;
    let mut script = String::from("#!/bin/sh\nset -e\n\n");
    for id in ordered {
        script.push_str(&format!(
            "echo '==> installing {}'\n/workspace/components/{}.sh install\n",
            id.id(),
            id.id()
        ));
    }

    let init_path = init_dir.join("init.sh");
    std::fs::write(&init_path, script)?;
    set_executable(&init_path)?;

    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> eyre::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> eyre::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_order_respects_depends_on() {
        let selection: BTreeSet<_> = [ComponentId::ClaudeFlow, ComponentId::Claude].into_iter().collect();
        let ordered = dependency_order(&selection).unwrap();
        let claude_idx = ordered.iter().position(|c| *c == ComponentId::Claude).unwrap();
        let flow_idx = ordered.iter().position(|c| *c == ComponentId::ClaudeFlow).unwrap();
        assert!(claude_idx < flow_idx);
    }

    #[test]
    fn system_requirements_dedup_across_selection() {
        let selection: BTreeSet<_> = [ComponentId::Claude, ComponentId::ClaudeFlow].into_iter().collect();
        assert_eq!(system_requirements(&selection), vec!["node"]);
    }

    #[test]
    fn stage_writes_one_script_per_component_plus_init() {
        let tmp = tempfile::tempdir().unwrap();
        let selection: BTreeSet<_> = [ComponentId::Claude, ComponentId::GithubCli].into_iter().collect();
        stage(tmp.path(), &selection).unwrap();
        assert!(tmp.path().join("components/claude.sh").is_file());
        assert!(tmp.path().join("components/github-cli.sh").is_file());
        assert!(tmp.path().join("init/init.sh").is_file());
    }

    #[test]
    fn stage_is_noop_for_empty_selection() {
        let tmp = tempfile::tempdir().unwrap();
        stage(tmp.path(), &BTreeSet::new()).unwrap();
        assert!(!tmp.path().join("components").exists());
    }
}
