use crate::chart::ChartType;
use crate::color;
use crate::data::Dataset;
use crate::graph::{AxisRole, CurvePoint, Graph, GraphError, GraphId, GraphSpec};
use crate::style::{GraphStyle, StyleUpdate};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info, warn};

/// Change notification delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GraphEvent {
    #[serde(rename_all = "camelCase")]
    GraphUpdated {
        #[serde(skip_serializing_if = "Option::is_none")]
        graph_id: Option<GraphId>,
    },
    #[serde(rename_all = "camelCase")]
    GraphDeleted { graph_id: GraphId },
}

impl GraphEvent {
    pub fn graph_id(&self) -> Option<&GraphId> {
        match self {
            GraphEvent::GraphUpdated { graph_id } => graph_id.as_ref(),
            GraphEvent::GraphDeleted { graph_id } => Some(graph_id),
        }
    }
}

/// Read-only view of the registered graphs in creation order
#[derive(Debug, Default)]
pub struct GraphStore {
    graphs: IndexMap<GraphId, Graph>,
}

impl GraphStore {
    pub fn get(&self, id: &GraphId) -> Option<&Graph> {
        self.graphs.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Graph> {
        self.graphs.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &GraphId> {
        self.graphs.keys()
    }

    pub fn contains(&self, id: &GraphId) -> bool {
        self.graphs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&GraphEvent, &GraphStore)>;

/// Owns every graph of a session and tells subscribers when one changes.
///
/// All mutation goes through here. Each successful mutation notifies every
/// subscriber, in subscription order, before the call returns; subscribers
/// see the store as it is after the change.
pub struct GraphRegistry {
    store: GraphStore,
    current: Option<GraphId>,
    observers: Vec<(SubscriptionId, Callback)>,
    next_subscription: u64,
}

impl Default for GraphRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GraphRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphRegistry")
            .field("store", &self.store)
            .field("current", &self.current)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl GraphRegistry {
    pub fn new() -> Self {
        Self {
            store: GraphStore::default(),
            current: None,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    // === Creation / removal ===

    /// Create and register a graph, returning `None` when the request is
    /// malformed.
    pub fn create_graph(&mut self, spec: GraphSpec) -> Option<GraphId> {
        match self.try_create_graph(spec) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Failed to create graph: {}", e);
                None
            }
        }
    }

    pub fn try_create_graph(&mut self, spec: GraphSpec) -> Result<GraphId, GraphError> {
        let graph = Graph::from_spec(spec)?;
        let id = graph.id().clone();
        info!(
            graph_id = %id,
            chart_type = %graph.chart_type(),
            features = ?graph.selected_features(),
            "Created graph"
        );
        self.store.graphs.insert(id.clone(), graph);
        self.notify(&GraphEvent::GraphUpdated { graph_id: None });
        Ok(id)
    }

    pub fn delete_graph(&mut self, id: &GraphId) -> bool {
        if self.store.graphs.shift_remove(id).is_none() {
            warn!(graph_id = %id, "Cannot delete graph: not found");
            return false;
        }
        if self.current.as_ref() == Some(id) {
            self.current = None;
        }
        info!(graph_id = %id, "Deleted graph");
        self.notify(&GraphEvent::GraphDeleted { graph_id: id.clone() });
        true
    }

    /// Swap in a new graph under an existing id
    pub fn replace_graph(&mut self, id: &GraphId, mut graph: Graph) -> bool {
        let Some(slot) = self.store.graphs.get_mut(id) else {
            warn!(graph_id = %id, "Cannot replace graph: not found");
            return false;
        };
        graph.rebind_id(id.clone());
        *slot = graph;
        info!(graph_id = %id, "Replaced graph");
        self.notify(&GraphEvent::GraphUpdated { graph_id: Some(id.clone()) });
        true
    }

    // === Mutations ===

    pub fn update_graph(&mut self, id: &GraphId, dataset: Dataset, style: GraphStyle) -> bool {
        self.mutate(id, "update graph", |graph| {
            graph.update_dataset(dataset);
            graph.replace_style(style);
        })
    }

    /// Set the series color. The string is handed to the renderer as is;
    /// one that is not a recognized CSS color is applied with a warning.
    pub fn change_graph_color(&mut self, id: &GraphId, color: &str) -> bool {
        self.mutate(id, "change color", |graph| {
            warn_unrecognized(graph.id(), color);
            graph.change_color(color);
        })
    }

    pub fn change_axis(&mut self, id: &GraphId, role: AxisRole, feature: &str) -> bool {
        self.mutate(id, "change axis", |graph| match role {
            AxisRole::X => graph.set_x_axis(feature),
            AxisRole::Y => graph.set_y_axis(feature),
            AxisRole::Z => graph.set_z_axis(feature),
        })
    }

    pub fn change_type(&mut self, id: &GraphId, chart_type: ChartType) -> bool {
        self.mutate(id, "change type", |graph| graph.set_type(chart_type))
    }

    pub fn apply_curve_fitting(&mut self, id: &GraphId, points: Vec<CurvePoint>) -> bool {
        self.mutate(id, "apply curve fitting", |graph| graph.set_fitted_curve(points))
    }

    pub fn clear_curve_fitting(&mut self, id: &GraphId) -> bool {
        self.mutate(id, "clear curve fitting", |graph| graph.clear_fitted_curve())
    }

    pub fn rename_graph(&mut self, id: &GraphId, name: &str) -> bool {
        self.mutate(id, "rename graph", |graph| graph.rename(name))
    }

    pub fn update_graph_style(&mut self, id: &GraphId, update: &StyleUpdate) -> bool {
        self.mutate(id, "update style", |graph| {
            for color in update.colors() {
                warn_unrecognized(graph.id(), color);
            }
            graph.update_style(update);
        })
    }

    pub fn toggle_graph_visibility(&mut self, id: &GraphId) -> bool {
        self.mutate(id, "toggle visibility", |graph| graph.toggle_visibility())
    }

    /// Shallow-merge `patch` into the graph's metadata
    pub fn set_graph_metadata(&mut self, id: &GraphId, patch: Map<String, Value>) -> bool {
        self.mutate(id, "set metadata", |graph| graph.set_metadata(patch))
    }

    pub fn set_showed_datapoints<I>(&mut self, id: &GraphId, rows: I) -> bool
    where
        I: IntoIterator<Item = usize>,
    {
        self.mutate(id, "set shown rows", |graph| graph.set_showed_datapoints(rows))
    }

    pub fn set_more_y_axes(&mut self, id: &GraphId, features: Vec<String>) -> bool {
        self.mutate(id, "set extra Y axes", |graph| graph.set_more_y_axes(features))
    }

    // === Current graph ===

    pub fn set_current_graph(&mut self, id: &GraphId) -> bool {
        if !self.store.contains(id) {
            warn!(graph_id = %id, "Cannot select graph: not found");
            return false;
        }
        debug!(graph_id = %id, "Current graph changed");
        self.current = Some(id.clone());
        true
    }

    pub fn current_graph(&self) -> Option<&Graph> {
        self.current.as_ref().and_then(|id| self.store.get(id))
    }

    // === Queries ===

    pub fn get_graph_by_id(&self, id: &GraphId) -> Option<&Graph> {
        self.store.get(id)
    }

    pub fn get_all_graphs(&self) -> impl Iterator<Item = &Graph> {
        self.store.iter()
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // === Subscriptions ===

    pub fn on_change<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&GraphEvent, &GraphStore) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(callback)));
        id
    }

    pub fn off_change(&mut self, subscription: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(id, _)| *id != subscription);
        self.observers.len() != before
    }

    /// Deliver `event` to every subscriber in subscription order
    pub fn notify(&mut self, event: &GraphEvent) {
        debug!(?event, subscribers = self.observers.len(), "Notifying subscribers");
        for (_, callback) in self.observers.iter_mut() {
            callback(event, &self.store);
        }
    }

    fn mutate<F>(&mut self, id: &GraphId, action: &str, op: F) -> bool
    where
        F: FnOnce(&mut Graph),
    {
        let Some(graph) = self.store.graphs.get_mut(id) else {
            warn!(graph_id = %id, "Cannot {}: graph not found", action);
            return false;
        };
        op(graph);
        debug!(graph_id = %id, "Applied {}", action);
        self.notify(&GraphEvent::GraphUpdated { graph_id: Some(id.clone()) });
        true
    }
}

fn warn_unrecognized(id: &GraphId, value: &str) {
    if let Err(e) = color::recognize(value) {
        warn!(graph_id = %id, "{}; applying it anyway", e);
    }
}
