use std::any::TypeId;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::mem;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
use std::sync::OnceLock;

/// Upper bound on assignable ids; exhausting it is fatal (§4.2/§4.8 of the
/// contract this registry implements).
const MAX_ID: u32 = 1 << 31;

static NEXT_ID: AtomicU32 = AtomicU32::new(0);

fn next_id() -> u32 {
    let id = NEXT_ID.fetch_add(1, AtomicOrdering::Relaxed);
    if id >= MAX_ID {
        tracing::error!(id, "component type id space exhausted, aborting");
        std::process::abort();
    }
    id
}

/// Classification of a registered component kind.
///
/// Declaration order is significant: [`ComponentType`]'s `Ord` impl sorts by
/// category first, and `Managed < Unmanaged < Tag` falls directly out of
/// this enum's variant order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentTypeCategory {
    /// Reserved for an unregistered sentinel; never produced by `type_of`.
    None,
    /// Contains a reference or handle to heap-allocated memory that needs
    /// ownership tracking, approximated here by `needs_drop::<T>()`.
    Managed,
    /// Trivially-copyable, non-empty bytes.
    Unmanaged,
    /// Zero-sized marker.
    Tag,
}

/// Process-wide registered descriptor for one kind of component.
///
/// `type_of::<T>()` is idempotent: every call for the same `T`, from any
/// thread, for the life of the process, returns a value with the same `id`.
#[derive(Debug, Clone, Copy)]
pub struct ComponentType {
    runtime_type: TypeId,
    id: u32,
    size: usize,
    category: ComponentTypeCategory,
}

impl ComponentType {
    /// Returns the registered descriptor for `T`, registering it on first
    /// call. Thread-safe; lazy; stable for the life of the process.
    pub fn type_of<T: 'static>() -> ComponentType {
        static CELL: OnceLock<ComponentType> = OnceLock::new();
        *CELL.get_or_init(|| {
            let id = next_id();
            let size = mem::size_of::<T>();
            let category = if size == 0 {
                ComponentTypeCategory::Tag
            } else if mem::needs_drop::<T>() {
                ComponentTypeCategory::Managed
            } else {
                ComponentTypeCategory::Unmanaged
            };
            tracing::debug!(
                id,
                size,
                category = ?category,
                type_name = std::any::type_name::<T>(),
                "component type registered"
            );
            ComponentType {
                runtime_type: TypeId::of::<T>(),
                id,
                size,
                category,
            }
        })
    }

    pub fn runtime_type(&self) -> TypeId {
        self.runtime_type
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn category(&self) -> ComponentTypeCategory {
        self.category
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for ComponentType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ComponentType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.category.cmp(&other.category).then(self.id.cmp(&other.id))
    }
}
