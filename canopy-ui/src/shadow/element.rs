use std::collections::HashMap;
use std::sync::Arc;

use canopy_types::{SurfaceId, Tag};
use serde::Deserialize;
use serde_json::Value;

use super::{ComponentName, RawProps, ShadowNode, ShadowNodeFragment, ShadowNodePtr};
use crate::error::SchedulerError;
use crate::ui_manager::UiManager;

/// Declarative description of a subtree, turned into shadow nodes by
/// [`Element::build`].
///
/// Tags identify nodes across renders: an element whose tag and component
/// match a node of the previous tree becomes a new revision of that node's
/// family, keeping its state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Element {
    pub component: ComponentName,
    pub tag: Tag,
    #[serde(default)]
    pub props: RawProps,
    #[serde(default)]
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(component: &str, tag: Tag) -> Self {
        Self {
            component: ComponentName::from(component),
            tag,
            props: RawProps::new(),
            children: Vec::new(),
        }
    }

    pub fn view(tag: Tag) -> Self {
        Self::new("View", tag)
    }

    pub fn text(tag: Tag, text: &str) -> Self {
        Self::new("Text", tag).prop("text", Value::from(text))
    }

    pub fn prop(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.props.insert(name.to_string(), value.into());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Builds this element into a node, reusing whatever `previous` already
    /// has: families by tag, props that compare equal, and whole subtrees
    /// that did not change at all.
    pub fn build(
        &self,
        ui_manager: &UiManager,
        surface_id: SurfaceId,
        previous: Option<&ShadowNode>,
    ) -> Result<ShadowNodePtr, SchedulerError> {
        let mut index = HashMap::new();
        if let Some(previous) = previous {
            index_by_tag(previous, &mut index);
        }
        self.build_with(ui_manager, surface_id, &index)
    }

    /// Builds a list of siblings against the same previous tree.
    pub fn build_all(
        elements: &[Element],
        ui_manager: &UiManager,
        surface_id: SurfaceId,
        previous: Option<&ShadowNode>,
    ) -> Result<Vec<ShadowNodePtr>, SchedulerError> {
        let mut index = HashMap::new();
        if let Some(previous) = previous {
            index_by_tag(previous, &mut index);
        }
        elements
            .iter()
            .map(|element| element.build_with(ui_manager, surface_id, &index))
            .collect()
    }

    fn build_with(
        &self,
        ui_manager: &UiManager,
        surface_id: SurfaceId,
        previous: &HashMap<Tag, &ShadowNodePtr>,
    ) -> Result<ShadowNodePtr, SchedulerError> {
        let children = self
            .children
            .iter()
            .map(|child| child.build_with(ui_manager, surface_id, previous))
            .collect::<Result<Vec<_>, _>>()?;

        let Some(&node) = previous
            .get(&self.tag)
            .filter(|node| node.component_name() == &self.component)
        else {
            return ui_manager.create_node(
                self.tag,
                &self.component,
                surface_id,
                &self.props,
                children,
            );
        };

        let props = node
            .family()
            .component_descriptor()
            .clone_props(None, &self.props)
            .map_err(|error| SchedulerError::InvalidProps {
                component: self.component.to_string(),
                message: error.to_string(),
            })?;
        let props_unchanged = props.props_eq(node.props().as_ref());
        let children_unchanged = children.len() == node.children().len()
            && children
                .iter()
                .zip(node.children())
                .all(|(new, old)| Arc::ptr_eq(new, old));

        if props_unchanged && children_unchanged {
            return Ok(node.clone());
        }

        let mut fragment = ShadowNodeFragment::new().children(children);
        if !props_unchanged {
            fragment = fragment.props(props);
        }
        Ok(Arc::new(node.clone_with(fragment)))
    }
}

fn index_by_tag<'a>(node: &'a ShadowNode, index: &mut HashMap<Tag, &'a ShadowNodePtr>) {
    for child in node.children() {
        index.insert(child.tag(), child);
        index_by_tag(child, index);
    }
}
