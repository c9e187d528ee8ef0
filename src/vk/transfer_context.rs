use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::Result;
use crate::vk::queue::Queue;

/// Auxiliary command buffer for blocking host ↔ device transfers.
///
/// Every submission is waited on before `immediate_submit` returns, so staging
/// buffers captured by the recording closure may be dropped right after.
pub struct TransferContext {
    transfer_fence: vk::Fence,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,

    queue: Arc<Queue>,
    device: Arc<ash::Device>,
}

impl TransferContext {
    pub fn new(
        queue: Arc<Queue>,
        device: Arc<ash::Device>,
    ) -> Result<Self> {
        let transfer_fence_info = vk::FenceCreateInfo::default();
        let transfer_fence =
            unsafe { device.create_fence(&transfer_fence_info, None)? };

        let command_pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue.family.index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let command_pool = match unsafe { device.create_command_pool(&command_pool_info, None) } {
            Ok(pool) => pool,
            Err(e) => {
                unsafe { device.destroy_fence(transfer_fence, None) };
                return Err(e.into());
            }
        };

        let command_buffer_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .command_buffer_count(1)
            .level(vk::CommandBufferLevel::PRIMARY);
        let command_buffer = match unsafe { device.allocate_command_buffers(&command_buffer_info) } {
            Ok(buffers) => buffers[0],
            Err(e) => {
                unsafe {
                    device.destroy_command_pool(command_pool, None);
                    device.destroy_fence(transfer_fence, None);
                }
                return Err(e.into());
            }
        };

        Ok(Self {
            transfer_fence,
            command_pool,
            command_buffer,
            queue,
            device,
        })
    }

    /// Record `func` into the auxiliary command buffer, submit it and block
    /// until the GPU has executed it.
    pub fn immediate_submit<F>(
        &self,
        func: F,
    ) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer, &ash::Device) -> Result<()>,
    {
        let cmd = self.command_buffer;

        let cmd_begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            self.device.begin_command_buffer(cmd, &cmd_begin_info)?;
        }

        let recorded = func(cmd, &self.device);

        unsafe {
            self.device.end_command_buffer(cmd)?;
        }
        if let Err(e) = recorded {
            // Nothing was submitted, the buffer just needs to go back to the initial state
            unsafe {
                self.device.reset_command_pool(
                    self.command_pool,
                    vk::CommandPoolResetFlags::empty(),
                )?;
            }
            return Err(e);
        }

        let cmd = [cmd];
        let submit = vk::SubmitInfo::default()
            .command_buffers(&cmd);
        unsafe {
            self.device.queue_submit(
                self.queue.handle,
                &[submit],
                self.transfer_fence,
            )?;
        }

        unsafe {
            self.device.wait_for_fences(&[self.transfer_fence], true, u64::MAX)?;
            self.device.reset_fences(&[self.transfer_fence])?;
            self.device.reset_command_pool(
                self.command_pool,
                vk::CommandPoolResetFlags::empty(),
            )?;
        }

        Ok(())
    }
}

impl Drop for TransferContext {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_command_pool(self.command_pool, None);
            self.device.destroy_fence(self.transfer_fence, None);
        }
    }
}
