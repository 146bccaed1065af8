use std::path::PathBuf;

use crate::{
    error::{Error, Result},
    management::{checked_id, read_json, write_json},
    types::Module,
};

/// Module definitions as written by the authoring product.
#[derive(Debug, Clone)]
pub struct ModuleStore {
    root: PathBuf,
}

impl ModuleStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Loads and validates a module. Unknown source or action kinds fail decoding.
    pub async fn load(&self, module_id: &str) -> Result<Module> {
        let module: Module = read_json(&self.module_path(module_id)?)
            .await?
            .ok_or_else(|| Error::NotFound(format!("module {}", module_id)))?;
        module.validate()?;
        Ok(module)
    }

    pub async fn persist(&self, module: &Module) -> Result<()> {
        module.validate()?;
        write_json(&self.module_path(&module.id)?, module).await
    }

    fn module_path(&self, module_id: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        path.push(format!("modules/{}.json", checked_id(module_id)?));
        Ok(path)
    }
}
