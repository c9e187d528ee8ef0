use std::sync::Arc;
use ash::vk;
use color_eyre::eyre::{eyre, OptionExt};
use color_eyre::Result;
use gpu_allocator::{
    vulkan::{Allocation, AllocationCreateDesc, AllocationScheme},
    MemoryLocation,
};
use crate::vk::device::VulkanDevice;

pub struct Buffer {
    pub buffer: vk::Buffer,
    pub size: u64,

    allocation: Option<Allocation>,
    device: Arc<VulkanDevice>,
}

impl Buffer {
    pub fn new(
        size: u64,
        usage: vk::BufferUsageFlags,
        name: &str,
        mem_loc: MemoryLocation,
        device: Arc<VulkanDevice>,
    ) -> Result<Self> {
        let buffer = {
            let buffer_info = vk::BufferCreateInfo::default()
                .size(size.max(1))
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);
            unsafe { device.logical.create_buffer(&buffer_info, None)? }
        };

        let requirements = unsafe {
            device.logical.get_buffer_memory_requirements(buffer)
        };
        let allocation = device
            .allocator()
            .and_then(|mut allocator| {
                Ok(allocator.allocate(&AllocationCreateDesc {
                    name,
                    requirements,
                    location: mem_loc,
                    linear: true,
                    allocation_scheme: AllocationScheme::DedicatedBuffer(buffer),
                })?)
            });
        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.logical.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        let bound = unsafe {
            device.logical.bind_buffer_memory(
                buffer,
                allocation.memory(),
                allocation.offset(),
            )
        };
        if let Err(e) = bound {
            if let Ok(mut allocator) = device.allocator() {
                let _ = allocator.free(allocation);
            }
            unsafe { device.logical.destroy_buffer(buffer, None) };
            return Err(e.into());
        }

        Ok(Self {
            buffer,
            size,

            allocation: Some(allocation),
            device,
        })
    }

    /// Host-visible staging buffer holding a copy of `data`.
    pub fn new_staging(
        data: &[u8],
        usage: vk::BufferUsageFlags,
        name: &str,
        device: Arc<VulkanDevice>,
    ) -> Result<Self> {
        let mut buffer = Self::new(
            data.len() as u64,
            usage,
            name,
            MemoryLocation::CpuToGpu,
            device,
        )?;
        buffer.write(data, 0)?;
        Ok(buffer)
    }

    pub fn write<T>(
        &mut self,
        data: &[T],
        start_offset: usize,
    ) -> Result<presser::CopyRecord>
    where
        T: Copy,
    {
        let allocation = self
            .allocation
            .as_mut()
            .ok_or_eyre("Buffer allocation does not exist")?;
        Ok(presser::copy_from_slice_to_offset(
            data,
            allocation,
            start_offset,
        )?)
    }

    /// Mapped contents of a host-visible buffer.
    pub fn mapped(&self) -> Result<&[u8]> {
        let allocation = self
            .allocation
            .as_ref()
            .ok_or_eyre("Buffer allocation does not exist")?;
        let slice = allocation
            .mapped_slice()
            .ok_or_else(|| eyre!("Buffer memory is not host visible"))?;
        Ok(&slice[..self.size as usize])
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            match self.device.allocator() {
                Ok(mut allocator) => {
                    if let Err(e) = allocator.free(allocation) {
                        log::error!("Failed to free buffer memory: {e}");
                    }
                }
                Err(e) => log::error!("Failed to lock memory allocator: {e}"),
            }
        }
        unsafe {
            self.device.logical.destroy_buffer(self.buffer, None);
        }
    }
}
