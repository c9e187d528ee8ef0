use std::sync::Arc;
use ash::vk;
use color_eyre::Result;
use crate::util::format::{vk_format_has_depth, vk_format_has_stencil};
use crate::vk::device::VulkanDevice;

/// Layout every attachment rests in outside of a render pass.
pub const ATTACHMENT_RESTING_LAYOUT: vk::ImageLayout = vk::ImageLayout::GENERAL;

/// Parameters a render pass was built from. Two passes with equal
/// descriptions are interchangeable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderPassDesc {
    pub color_format: vk::Format,
    pub color_final_layout: vk::ImageLayout,
    /// `UNDEFINED` when there is no depth/stencil attachment
    pub depth_stencil_format: vk::Format,
    pub depth_write_enable: bool,
    pub stencil_write_enable: bool,
}

pub struct RenderPass {
    pub render_pass: vk::RenderPass,
    pub desc: RenderPassDesc,
    device: Arc<VulkanDevice>,
}

impl RenderPass {
    /// One subpass with an optional colour attachment and an optional
    /// depth/stencil attachment. Attachments are loaded and stored, so a GL
    /// frame may span several passes.
    pub fn create(desc: RenderPassDesc, device: Arc<VulkanDevice>) -> Result<Self> {
        let mut attachments = Vec::with_capacity(2);
        let mut color_ref = None;
        let mut depth_ref = None;

        if desc.color_format != vk::Format::UNDEFINED {
            color_ref = Some(
                vk::AttachmentReference::default()
                    .attachment(attachments.len() as u32)
                    .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL),
            );
            attachments.push(
                vk::AttachmentDescription::default()
                    .format(desc.color_format)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(vk::AttachmentLoadOp::LOAD)
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(ATTACHMENT_RESTING_LAYOUT)
                    .final_layout(desc.color_final_layout),
            );
        }

        if desc.depth_stencil_format != vk::Format::UNDEFINED {
            let has_depth = vk_format_has_depth(desc.depth_stencil_format);
            let has_stencil = vk_format_has_stencil(desc.depth_stencil_format);
            let write = (has_depth && desc.depth_write_enable)
                || (has_stencil && desc.stencil_write_enable);
            let layout = if write {
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
            } else {
                vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL
            };
            let op = |present: bool| {
                if present {
                    (vk::AttachmentLoadOp::LOAD, vk::AttachmentStoreOp::STORE)
                } else {
                    (vk::AttachmentLoadOp::DONT_CARE, vk::AttachmentStoreOp::DONT_CARE)
                }
            };
            let (load_op, store_op) = op(has_depth);
            let (stencil_load_op, stencil_store_op) = op(has_stencil);

            depth_ref = Some(
                vk::AttachmentReference::default()
                    .attachment(attachments.len() as u32)
                    .layout(layout),
            );
            attachments.push(
                vk::AttachmentDescription::default()
                    .format(desc.depth_stencil_format)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(load_op)
                    .store_op(store_op)
                    .stencil_load_op(stencil_load_op)
                    .stencil_store_op(stencil_store_op)
                    .initial_layout(ATTACHMENT_RESTING_LAYOUT)
                    .final_layout(ATTACHMENT_RESTING_LAYOUT),
            );
        }

        let color_refs: Vec<_> = color_ref.into_iter().collect();
        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if let Some(depth_ref) = depth_ref.as_ref() {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }

        // Order the pass against transfers and earlier passes on the same queue
        let dependencies = [
            vk::SubpassDependency::default()
                .src_subpass(vk::SUBPASS_EXTERNAL)
                .dst_subpass(0)
                .src_stage_mask(vk::PipelineStageFlags::ALL_COMMANDS)
                .dst_stage_mask(vk::PipelineStageFlags::ALL_GRAPHICS)
                .src_access_mask(vk::AccessFlags::MEMORY_WRITE)
                .dst_access_mask(vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE),
            vk::SubpassDependency::default()
                .src_subpass(0)
                .dst_subpass(vk::SUBPASS_EXTERNAL)
                .src_stage_mask(vk::PipelineStageFlags::ALL_GRAPHICS)
                .dst_stage_mask(vk::PipelineStageFlags::ALL_COMMANDS)
                .src_access_mask(vk::AccessFlags::MEMORY_WRITE)
                .dst_access_mask(vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE),
        ];

        let subpasses = [subpass];
        let info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);
        let render_pass = unsafe { device.logical.create_render_pass(&info, None)? };

        log::debug!("Created render pass {:?}", desc);
        Ok(Self {
            render_pass,
            desc,
            device,
        })
    }

    pub fn begin(
        &self,
        cmd: vk::CommandBuffer,
        framebuffer: &FramebufferObject,
        width: u32,
        height: u32,
    ) {
        let info = vk::RenderPassBeginInfo::default()
            .render_pass(self.render_pass)
            .framebuffer(framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D { width, height },
            });
        unsafe {
            self.device
                .logical
                .cmd_begin_render_pass(cmd, &info, vk::SubpassContents::INLINE);
        }
    }

    pub fn end(&self, cmd: vk::CommandBuffer) {
        unsafe { self.device.logical.cmd_end_render_pass(cmd) };
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.logical.destroy_render_pass(self.render_pass, None);
        }
    }
}

/// A `vk::Framebuffer` plus the attachment views it was created with.
pub struct FramebufferObject {
    pub framebuffer: vk::Framebuffer,
    views: Vec<vk::ImageView>,
    device: Arc<VulkanDevice>,
}

impl FramebufferObject {
    /// Takes ownership of `views`; they are destroyed with the framebuffer.
    pub fn create(
        render_pass: &RenderPass,
        views: Vec<vk::ImageView>,
        width: u32,
        height: u32,
        device: Arc<VulkanDevice>,
    ) -> Result<Self> {
        let info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.render_pass)
            .attachments(&views)
            .width(width)
            .height(height)
            .layers(1);
        let framebuffer = match unsafe { device.logical.create_framebuffer(&info, None) } {
            Ok(framebuffer) => framebuffer,
            Err(e) => {
                for view in views {
                    unsafe { device.logical.destroy_image_view(view, None) };
                }
                return Err(e.into());
            }
        };
        Ok(Self {
            framebuffer,
            views,
            device,
        })
    }
}

impl Drop for FramebufferObject {
    fn drop(&mut self) {
        unsafe {
            self.device.logical.destroy_framebuffer(self.framebuffer, None);
            for view in self.views.drain(..) {
                self.device.logical.destroy_image_view(view, None);
            }
        }
    }
}
