//! Linked programs handed over by the shader compiler, and their uniforms.

use crate::error::GlError;
use crate::gl::*;
use crate::resources::{ProgramDesc, ShaderProgram};
use super::Context;

impl Context {
    /// Register a linked program. Returns its GL name.
    pub fn create_program(&mut self, desc: ProgramDesc) -> GLuint {
        let handle = self.programs.insert(ShaderProgram::new(desc, self.device.clone()));
        let [name] = self.program_names.generate(1)[..] else {
            return 0;
        };
        self.program_names.bind(name, handle);
        name
    }

    pub fn is_program(&self, name: GLuint) -> bool {
        self.program_names.get(name).is_some()
    }

    /// glDeleteProgram. A program in use stays alive until it is replaced.
    pub fn delete_program(&mut self, name: GLuint) {
        if name == 0 {
            return;
        }
        let Some(handle) = self.program_names.remove(name) else {
            self.state.set_error(GlError::InvalidValue);
            return;
        };
        self.release_program(handle);
    }

    pub fn use_program(&mut self, name: GLuint) {
        let handle = if name == 0 {
            None
        } else {
            let Some(handle) = self.program_names.get(name) else {
                self.state.set_error(GlError::InvalidValue);
                return;
            };
            self.programs.retain(handle);
            Some(handle)
        };
        if let Some(previous) = self.state.active_objects.update_program(handle) {
            self.release_program(previous);
        }
    }

    fn current_program(&mut self) -> Option<&mut ShaderProgram> {
        let Some(handle) = self.state.active_objects.program() else {
            self.state.set_error(GlError::InvalidOperation);
            return None;
        };
        self.programs.get_mut(handle)
    }

    /// glUniform1i on a sampler uniform: select the texture unit it reads.
    pub fn uniform_sampler(&mut self, location: GLint, unit: GLint) {
        if unit < 0 {
            self.state.set_error(GlError::InvalidValue);
            return;
        }
        let max_units = self.config.max_texture_units;
        let Some(program) = self.current_program() else {
            return;
        };
        let result = program.set_sampler_unit(location, unit as u32, max_units);
        self.record(result);
    }

    /// Write bytes into the current program's uniform block at `offset`.
    pub fn uniform_data(&mut self, offset: usize, data: &[u8]) {
        let Some(program) = self.current_program() else {
            return;
        };
        let result = program.set_uniform_data(offset, data);
        self.record(result);
    }
}
