//! Compiled shader programs

use crate::gfx::resources::shader::ShaderAsset;

use super::{
    backend::{GpuBackend, ShaderId},
    context::GpuContext,
    error::GpuError,
};

/// A shader program compiled from a [`ShaderAsset`].
#[derive(Debug)]
pub struct Shader {
    label: String,
    id: Option<ShaderId>,
}

impl Shader {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            id: None,
        }
    }

    pub fn create<B: GpuBackend>(
        &mut self,
        ctx: &mut GpuContext<B>,
        asset: &ShaderAsset,
    ) -> Result<(), GpuError> {
        if self.id.is_some() {
            return Err(GpuError::AlreadyCreated {
                label: self.label.clone(),
            });
        }
        self.id = Some(ctx.create_shader(asset)?);
        Ok(())
    }

    pub fn bind<B: GpuBackend>(&self, ctx: &mut GpuContext<B>) -> Result<(), GpuError> {
        let id = self.id.ok_or_else(|| GpuError::NotCreated {
            label: self.label.clone(),
        })?;
        ctx.bind_shader(id);
        Ok(())
    }

    pub fn release<B: GpuBackend>(&mut self, ctx: &mut GpuContext<B>) {
        if let Some(id) = self.id.take() {
            ctx.release_shader(id);
        }
    }

    pub fn id(&self) -> Option<ShaderId> {
        self.id
    }
}
