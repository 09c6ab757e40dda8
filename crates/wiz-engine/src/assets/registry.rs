use std::collections::HashMap;

use crate::assets::manifest::{check_speed, DataError, Definitions, ObjectDef, TileDef};
use crate::core::actions::{Command, CommandArg, QueuedAction};
use crate::core::geometry::TileShape;
use crate::core::primitives::Primitive;

/// Validated static definitions with name-based lookup.
///
/// Every behavior, control binding and attach list is checked when the
/// registry is built, so the interpreter only meets names that exist.
#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    tiles: Vec<TileDef>,
    objects: HashMap<String, ObjectDef>,
    behaviors: HashMap<String, Vec<QueuedAction>>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate definitions from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        Self::from_definitions(Definitions::from_json(json)?)
    }

    /// Validate parsed definitions.
    pub fn from_definitions(defs: Definitions) -> Result<Self, DataError> {
        let registry = Self {
            tiles: defs.tiles,
            objects: defs.objects,
            behaviors: defs.behaviors,
        };

        for (name, timeline) in &registry.behaviors {
            for (index, action) in timeline.iter().enumerate() {
                registry.check_command(&format!("behavior {name:?}"), index, &action.command, None)?;
            }
        }

        for (name, def) in &registry.objects {
            let owner = format!("object {name:?}");
            check_speed(&owner, "max_speed", def.max_speed)?;
            if let Some(behavior) = &def.behavior {
                let timeline = registry
                    .behaviors
                    .get(behavior)
                    .ok_or_else(|| DataError::UnknownBehavior(behavior.clone()))?;
                for (index, action) in timeline.iter().enumerate() {
                    registry.check_command(&owner, index, &action.command, Some((name, def)))?;
                }
            }
            for (index, binding) in def.controls.iter().enumerate() {
                registry.check_command(&owner, index, &binding.command, Some((name, def)))?;
            }
            for template in &def.attach {
                check_template(name, def, template)?;
            }
        }

        Ok(registry)
    }

    fn check_command(
        &self,
        owner: &str,
        index: usize,
        command: &Command,
        object: Option<(&String, &ObjectDef)>,
    ) -> Result<(), DataError> {
        let expected = command.primitive.arg_kind();
        if command.arg.kind() != expected {
            return Err(DataError::BadArgument {
                owner: owner.to_string(),
                index,
                primitive: command.primitive,
                expected,
                found: command.arg.kind(),
            });
        }
        match (command.primitive, &command.arg) {
            (Primitive::Spawn | Primitive::Fire, CommandArg::Text(name)) if !self.objects.contains_key(name) => {
                Err(DataError::UnknownObject(name.clone()))
            }
            (Primitive::LoadBehavior, CommandArg::Text(name)) if !self.behaviors.contains_key(name) => {
                Err(DataError::UnknownBehavior(name.clone()))
            }
            (Primitive::SpawnHitbox, CommandArg::Text(template)) => match object {
                Some((name, def)) => check_template(name, def, template),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    /// Tile table, indexed by tile id.
    pub fn tiles(&self) -> &[TileDef] {
        &self.tiles
    }

    pub fn tile_shapes(&self) -> Vec<Option<TileShape>> {
        self.tiles.iter().map(|t| t.shape).collect()
    }

    pub fn object(&self, name: &str) -> Option<&ObjectDef> {
        self.objects.get(name)
    }

    pub fn behavior(&self, name: &str) -> Option<&[QueuedAction]> {
        self.behaviors.get(name).map(Vec::as_slice)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

fn check_template(object: &str, def: &ObjectDef, template: &str) -> Result<(), DataError> {
    if def.hitboxes.contains_key(template) {
        Ok(())
    } else {
        Err(DataError::UnknownHitbox {
            object: object.to_string(),
            template: template.to_string(),
        })
    }
}
