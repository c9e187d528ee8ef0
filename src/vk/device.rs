use std::ffi::{c_char, CStr};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex, MutexGuard};
use ash::vk;
use color_eyre::eyre::{eyre, OptionExt};
use color_eyre::Result;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use crate::config::GloveConfig;
use crate::vk::instance::VulkanInstance;
use crate::vk::queue::{Queue, QueueFamily};
use crate::vk::transfer_context::TransferContext;

/// Logical device plus the shared services every GPU-backed resource needs:
/// the memory allocator and the auxiliary transfer context.
///
/// Resources keep an `Arc<VulkanDevice>`, so the device outlives all of them.
pub struct VulkanDevice {
    pub logical: Arc<ash::Device>,
    pub physical: vk::PhysicalDevice,
    pub properties: vk::PhysicalDeviceProperties,
    pub graphics_queue: Arc<Queue>,

    memory_allocator: ManuallyDrop<Mutex<Allocator>>,
    transfer_context: ManuallyDrop<TransferContext>,
    instance: VulkanInstance,
}

impl VulkanDevice {
    pub fn new(config: &GloveConfig) -> Result<Arc<Self>> {
        let instance = VulkanInstance::new(config)?;

        let (physical_device, graphics_queue_family) =
            Self::select_physical_device(&instance.instance)?;
        let properties = unsafe {
            instance.instance.get_physical_device_properties(physical_device)
        };
        log::info!(
            "Using physical device {:?}",
            properties.device_name_as_c_str().unwrap_or(c"<unknown>"),
        );

        let (logical_device, graphics_queue) = Self::create_logical_device(
            &instance.instance,
            &physical_device,
            graphics_queue_family,
        )?;
        let logical_device = Arc::new(logical_device);
        let graphics_queue = Arc::new(graphics_queue);

        let memory_allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.instance.clone(),
            device: (*logical_device).clone(),
            physical_device,
            debug_settings: gpu_allocator::AllocatorDebugSettings {
                log_memory_information: false,
                log_leaks_on_shutdown: true,
                store_stack_traces: false,
                log_allocations: false,
                log_frees: false,
                log_stack_traces: false,
            },
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        });
        let memory_allocator = match memory_allocator {
            Ok(allocator) => allocator,
            Err(e) => {
                unsafe { logical_device.destroy_device(None) };
                return Err(e.into());
            }
        };

        let transfer_context = match TransferContext::new(
            graphics_queue.clone(),
            logical_device.clone(),
        ) {
            Ok(ctx) => ctx,
            Err(e) => {
                drop(memory_allocator);
                unsafe { logical_device.destroy_device(None) };
                return Err(e);
            }
        };

        Ok(Arc::new(Self {
            logical: logical_device,
            physical: physical_device,
            properties,
            graphics_queue,

            memory_allocator: ManuallyDrop::new(Mutex::new(memory_allocator)),
            transfer_context: ManuallyDrop::new(transfer_context),
            instance,
        }))
    }

    pub fn allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.memory_allocator
            .lock()
            .map_err(|e| eyre!(e.to_string()))
    }

    /// Submit one-shot work on the auxiliary command buffer and wait for it.
    pub fn immediate_submit<F>(
        &self,
        func: F,
    ) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer, &ash::Device) -> Result<()>,
    {
        self.transfer_context.immediate_submit(func)
    }

    pub fn wait_idle(&self) -> Result<()> {
        unsafe { self.logical.device_wait_idle()? };
        Ok(())
    }

    pub fn format_properties(&self, format: vk::Format) -> vk::FormatProperties {
        unsafe {
            self.instance
                .instance
                .get_physical_device_format_properties(self.physical, format)
        }
    }

    fn select_physical_device(
        instance: &ash::Instance,
    ) -> Result<(vk::PhysicalDevice, QueueFamily)> {
        let devices = unsafe { instance.enumerate_physical_devices()? };
        devices
            .into_iter()
            .filter(|device| RequiredDeviceFeatures::new(device, instance).has_all())
            .filter_map(|device| {
                let props = unsafe {
                    instance.get_physical_device_queue_family_properties(device)
                };
                props
                    .iter()
                    .enumerate()
                    .map(|(i, p)| QueueFamily::new(i as u32, *p))
                    .find(|family| family.supports_graphics())
                    .map(|family| (device, family))
            })
            .min_by_key(|(device, _)| {
                let props = unsafe { instance.get_physical_device_properties(*device) };
                match props.device_type {
                    vk::PhysicalDeviceType::DISCRETE_GPU => 0,
                    vk::PhysicalDeviceType::INTEGRATED_GPU => 1,
                    vk::PhysicalDeviceType::VIRTUAL_GPU => 2,
                    vk::PhysicalDeviceType::CPU => 3,
                    vk::PhysicalDeviceType::OTHER => 4,
                    _ => 5,
                }
            })
            .ok_or_eyre("No suitable physical device found")
    }

    fn create_logical_device(
        instance: &ash::Instance,
        physical_device: &vk::PhysicalDevice,
        graphics_queue_family: QueueFamily,
    ) -> Result<(ash::Device, Queue)> {
        let queue_priorities = [1.0];
        let queue_create_infos = [
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_queue_family.index)
                .queue_priorities(&queue_priorities),
        ];

        let enabled_extension_names = Self::get_required_device_extensions()
            .iter()
            .map(|ext| ext.as_ptr())
            .collect::<Vec<*const c_char>>();

        let mut enabled_features = RequiredDeviceFeatures::new(physical_device, instance);
        if !enabled_features.has_all() {
            return Err(eyre!("Required features not supported"));
        }

        let device = {
            let mut features = vk::PhysicalDeviceFeatures2::default()
                .features(enabled_features.core)
                .push_next(&mut enabled_features.synchronization2_features);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&enabled_extension_names)
                .push_next(&mut features);

            unsafe {
                instance.create_device(*physical_device, &device_create_info, None)?
            }
        };

        let graphics_queue = unsafe {
            let queue = device.get_device_queue(graphics_queue_family.index, 0);
            Queue::new(graphics_queue_family, queue)
        };

        Ok((device, graphics_queue))
    }

    fn get_required_device_extensions() -> Vec<&'static CStr> {
        vec![
            #[cfg(target_os = "macos")]
            ash::khr::portability_subset::NAME,
        ]
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.logical.device_wait_idle() {
                log::error!("Failed to wait for device idle: {e}");
            }
            ManuallyDrop::drop(&mut self.transfer_context);
            ManuallyDrop::drop(&mut self.memory_allocator);
            self.logical.destroy_device(None);
        }
        // `instance` is dropped after this, destroying the messenger and instance
    }
}

struct RequiredDeviceFeatures<'a> {
    pub core: vk::PhysicalDeviceFeatures,
    pub synchronization2_features: vk::PhysicalDeviceSynchronization2Features<'a>,
}

impl RequiredDeviceFeatures<'_> {
    pub fn new(
        physical_device: &vk::PhysicalDevice,
        instance: &ash::Instance,
    ) -> Self {
        let mut synchronization2_features =
            vk::PhysicalDeviceSynchronization2Features::default();

        let supported_core = {
            let mut features = vk::PhysicalDeviceFeatures2::default()
                .push_next(&mut synchronization2_features);
            unsafe {
                instance.get_physical_device_features2(*physical_device, &mut features);
            }
            features.features
        };

        // Optional: glLineWidth, GL_COLOR_LOGIC_OP and point/line polygon modes
        let core = vk::PhysicalDeviceFeatures::default()
            .wide_lines(supported_core.wide_lines == vk::TRUE)
            .logic_op(supported_core.logic_op == vk::TRUE)
            .fill_mode_non_solid(supported_core.fill_mode_non_solid == vk::TRUE);

        Self {
            core,
            synchronization2_features,
        }
    }

    pub fn has_all(&self) -> bool {
        self.synchronization2_features.synchronization2 == vk::TRUE
    }
}
