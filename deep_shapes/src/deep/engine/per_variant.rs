use super::Evaluation;
use crate::deep::{error::DeepResult, variants::VariantId};

impl Evaluation<'_> {
    /// One kernel call per variant with shapes. The result shares the input hierarchy.
    pub(super) fn per_variant(&mut self) -> DeepResult<VariantId> {
        let a = self.a.clone();
        let mut variants: Vec<VariantId> = a.shapes.keys().copied().collect();
        variants.sort_unstable();
        for v in variants {
            let Some(shapes) = a.shapes_of(v) else {
                continue;
            };
            let info = self.info(v)?;
            let result = self.compute_local(info.cell, shapes, None);
            self.emit(v, result);
        }
        Ok(a.root)
    }
}
