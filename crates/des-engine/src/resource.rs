//! The resource seam.
//!
//! A resource's queue discipline and capacity algorithm are not the kernel's
//! business.  The kernel only needs two things from a resource: its name (for
//! statistics and warnings) and the ability to force an arrival out of it —
//! which the kernel invokes while terminating or reneging an arrival that
//! still holds the resource.
//!
//! Membership bookkeeping is the arrival's side of the relationship:
//! [`Arrival::register_entity`][crate::Arrival::register_entity] /
//! [`unregister_entity`][crate::Arrival::unregister_entity] are driven by the
//! seize/release path (or by the kernel's own release loops), never by
//! `Resource::erase` itself.

use des_core::ResourceId;
use rustc_hash::FxHashMap;

use crate::activity::SimCtx;
use crate::arrival::Arrival;

/// An external resource an arrival can hold.
pub trait Resource {
    /// The resource's name, used in release records and leak warnings.
    fn name(&self) -> &str;

    /// Remove `arrival` from this resource's servers or queue.
    ///
    /// `force` bypasses any policy that would otherwise keep the arrival in
    /// place (used when the arrival is being destroyed).  Returns `true` if
    /// this call itself deactivated the arrival — the caller then skips its
    /// own deactivation.
    ///
    /// Must not touch the arrival's membership set; the caller unregisters
    /// after a successful erase.
    fn erase(&mut self, arrival: &mut Arrival, ctx: &mut SimCtx<'_>, force: bool) -> bool;
}

/// The engine's resource registry.
pub type ResourceMap = FxHashMap<ResourceId, Box<dyn Resource>>;
