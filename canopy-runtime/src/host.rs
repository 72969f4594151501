use canopy_types::SurfaceId;
use canopy_ui::mounting::MutationKind;
use canopy_ui::{HostViewLayer, ShadowView, ShadowViewMutation, StubViewError, StubViewTree};
use colored::Colorize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Pretty,
    Json,
}

/// Prints every mutation it mounts and keeps a checked mirror of the views.
pub struct PrintingHost {
    mirror: StubViewTree,
    output: Output,
}

impl PrintingHost {
    pub fn new(root: &ShadowView, output: Output) -> Self {
        Self {
            mirror: StubViewTree::new(root),
            output,
        }
    }

    pub fn mirror(&self) -> &StubViewTree {
        &self.mirror
    }

    pub fn print_revision(&self, revision: u64) {
        if self.output == Output::Pretty {
            println!("  {}", format!("now at revision {revision}").dimmed());
        }
    }

    fn print(&self, surface_id: SurfaceId, mutation: &ShadowViewMutation) {
        match self.output {
            Output::Json => {
                let line = json!({
                    "surface": surface_id,
                    "kind": format!("{:?}", mutation.kind()),
                    "tag": mutation.tag(),
                    "parent": mutation.parent_tag(),
                    "index": mutation.index(),
                });
                println!("{line}");
            }
            Output::Pretty => {
                let text = mutation.to_string();
                let text = match mutation.kind() {
                    MutationKind::Create => text.green(),
                    MutationKind::Delete => text.red(),
                    MutationKind::Insert => text.cyan(),
                    MutationKind::Remove => text.yellow(),
                    MutationKind::Update => text.blue(),
                };
                println!("  {text}");
            }
        }
    }
}

impl HostViewLayer for PrintingHost {
    type Error = StubViewError;

    fn apply_mutations(
        &mut self,
        surface_id: SurfaceId,
        mutations: &[ShadowViewMutation],
    ) -> Result<(), StubViewError> {
        if self.output == Output::Pretty {
            println!("{}", format!("transaction ({} mutations)", mutations.len()).bold());
        }
        for mutation in mutations {
            self.print(surface_id, mutation);
        }
        self.mirror.apply(mutations)
    }
}
