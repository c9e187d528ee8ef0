use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use crate::vk::device::VulkanDevice;

const MAX_SETS_PER_FRAME: u32 = 1024;

/// The context's primary command buffer. Recording starts with the first
/// draw or clear of a frame and ends with a blocking submit in `finish`.
pub struct FrameRecorder {
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    // Signals when all rendering commands have finished execution
    render_fence: vk::Fence,
    // Sampler descriptors for the frame's draws; reset after each submit
    descriptor_pool: vk::DescriptorPool,
    recording: bool,
    device: Arc<VulkanDevice>,
}

impl FrameRecorder {
    pub fn new(device: Arc<VulkanDevice>) -> Result<Self> {
        let logical = &device.logical;
        let command_pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(device.graphics_queue.family.index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let command_pool = unsafe { logical.create_command_pool(&command_pool_info, None)? };

        let command_buffer_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .command_buffer_count(1)
            .level(vk::CommandBufferLevel::PRIMARY);
        let command_buffer = match unsafe { logical.allocate_command_buffers(&command_buffer_info) } {
            Ok(buffers) => buffers[0],
            Err(e) => {
                unsafe { logical.destroy_command_pool(command_pool, None) };
                return Err(e.into());
            }
        };

        let render_fence = match unsafe { logical.create_fence(&vk::FenceCreateInfo::default(), None) } {
            Ok(fence) => fence,
            Err(e) => {
                unsafe { logical.destroy_command_pool(command_pool, None) };
                return Err(e.into());
            }
        };

        let pool_sizes = [vk::DescriptorPoolSize::default()
            .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(MAX_SETS_PER_FRAME * 4)];
        let descriptor_pool_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(MAX_SETS_PER_FRAME)
            .pool_sizes(&pool_sizes);
        let descriptor_pool = match unsafe { logical.create_descriptor_pool(&descriptor_pool_info, None) } {
            Ok(pool) => pool,
            Err(e) => {
                unsafe {
                    logical.destroy_fence(render_fence, None);
                    logical.destroy_command_pool(command_pool, None);
                }
                return Err(e.into());
            }
        };

        Ok(Self {
            command_pool,
            command_buffer,
            render_fence,
            descriptor_pool,
            recording: false,
            device,
        })
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Command buffer of the current frame, beginning it when needed.
    pub fn command_buffer(&mut self) -> Result<vk::CommandBuffer> {
        if !self.recording {
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            unsafe {
                self.device
                    .logical
                    .begin_command_buffer(self.command_buffer, &begin_info)?;
            }
            self.recording = true;
        }
        Ok(self.command_buffer)
    }

    pub fn allocate_descriptor_set(&self, layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        let layouts = [layout];
        let info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.descriptor_pool)
            .set_layouts(&layouts);
        let sets = unsafe { self.device.logical.allocate_descriptor_sets(&info) }
            .map_err(|e| eyre!("Failed to allocate descriptor set: {e}"))?;
        Ok(sets[0])
    }

    /// Submit the recorded frame and block until the GPU is done with it.
    /// A no-op when nothing was recorded.
    pub fn submit_and_wait(&mut self) -> Result<()> {
        if !self.recording {
            return Ok(());
        }
        self.recording = false;

        let logical = &self.device.logical;
        unsafe {
            logical.end_command_buffer(self.command_buffer)?;

            let cmd = [self.command_buffer];
            let submit = vk::SubmitInfo::default().command_buffers(&cmd);
            logical.queue_submit(self.device.graphics_queue.handle, &[submit], self.render_fence)?;

            logical.wait_for_fences(&[self.render_fence], true, u64::MAX)?;
            logical.reset_fences(&[self.render_fence])?;
            logical.reset_command_pool(self.command_pool, vk::CommandPoolResetFlags::empty())?;
            logical.reset_descriptor_pool(self.descriptor_pool, vk::DescriptorPoolResetFlags::empty())?;
        }
        log::trace!("Frame submitted and completed");
        Ok(())
    }
}

impl Drop for FrameRecorder {
    fn drop(&mut self) {
        if self.recording {
            log::warn!("Dropping frame recorder while still recording");
        }
        unsafe {
            let logical = &self.device.logical;
            logical.destroy_descriptor_pool(self.descriptor_pool, None);
            logical.destroy_fence(self.render_fence, None);
            logical.destroy_command_pool(self.command_pool, None);
        }
    }
}
