//! Mailbox front-end for an [`AddressManager`].
//!
//! A single runner task owns the bus, the registry, and the claim state
//! machine; other tasks never touch them directly. Producers push
//! outbound frames through an [`AddressHandle`], and consumers pull the
//! application traffic the manager did not absorb from an
//! [`AddressFrames`] receiver. Both sides are optional: firmware passes
//! in only the pre-allocated [`embassy_sync::channel::Channel`] instances
//! it needs, and the library allocates nothing.

use core::fmt::Debug;

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Channel, Receiver, Sender},
};
use futures_util::{future::select, future::Either, pin_mut};

use crate::error::ClaimError;
use crate::protocol::management::address_manager::AddressManager;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::traits::{can_bus::CanBus, delay::Delay};

/// Work items queued for the runner task.
#[derive(Clone)]
pub enum SupervisorCommand {
    SendFrame(CanFrame),
}

/// What woke the runner up: bus traffic or a queued command.
enum Wakeup {
    Inbound(CanFrame),
    Command(SupervisorCommand),
}

/// Configuration stage of the supervisor: a manager plus the channels the
/// firmware chose to provide.
pub struct AddressService<'a, C: CanBus, D: Delay, const CMD_CAP: usize, const FRAME_CAP: usize>
where
    C::Error: Debug,
{
    manager: AddressManager<C, D>,
    command_channel: Option<&'a Channel<CriticalSectionRawMutex, SupervisorCommand, CMD_CAP>>,
    frame_channel: Option<&'a Channel<CriticalSectionRawMutex, CanFrame, FRAME_CAP>>,
}

impl<'a, C, D, const CMD_CAP: usize, const FRAME_CAP: usize>
    AddressService<'a, C, D, CMD_CAP, FRAME_CAP>
where
    C: CanBus,
    C::Error: Debug,
    D: Delay,
{
    /// Attach the channels to a manager whose claim already resolved.
    pub fn new(
        manager: AddressManager<C, D>,
        command_channel: Option<&'a Channel<CriticalSectionRawMutex, SupervisorCommand, CMD_CAP>>,
        frame_channel: Option<&'a Channel<CriticalSectionRawMutex, CanFrame, FRAME_CAP>>,
    ) -> Self {
        Self {
            manager,
            command_channel,
            frame_channel,
        }
    }

    /// Tear the service apart into the pieces each task keeps: a sender
    /// handle, a frame receiver, and the runner that owns everything else.
    /// A piece is `None` when the matching channel was not provided.
    pub fn into_parts(self) -> AddressServiceParts<'a, C, D, CMD_CAP, FRAME_CAP> {
        let runner = AddressRunner {
            manager: self.manager,
            command_channel: self.command_channel,
            frame_channel: self.frame_channel,
        };
        AddressServiceParts {
            handle: self.command_channel.map(|channel| AddressHandle {
                sender: channel.sender(),
            }),
            frames: self.frame_channel.map(|channel| AddressFrames {
                receiver: channel.receiver(),
            }),
            runner,
        }
    }
}

/// Pieces produced by [`AddressService::into_parts`].
pub struct AddressServiceParts<'a, C, D, const CMD_CAP: usize, const FRAME_CAP: usize>
where
    C: CanBus,
    C::Error: Debug,
    D: Delay,
{
    pub handle: Option<AddressHandle<'a, CMD_CAP>>,
    pub frames: Option<AddressFrames<'a, FRAME_CAP>>,
    pub runner: AddressRunner<'a, C, D, CMD_CAP, FRAME_CAP>,
}

/// The task that owns the manager and serializes every wakeup into it.
pub struct AddressRunner<'a, C, D, const CMD_CAP: usize, const FRAME_CAP: usize>
where
    C: CanBus,
    C::Error: Debug,
    D: Delay,
{
    manager: AddressManager<C, D>,
    command_channel: Option<&'a Channel<CriticalSectionRawMutex, SupervisorCommand, CMD_CAP>>,
    frame_channel: Option<&'a Channel<CriticalSectionRawMutex, CanFrame, FRAME_CAP>>,
}

impl<'a, C, D, const CMD_CAP: usize, const FRAME_CAP: usize>
    AddressRunner<'a, C, D, CMD_CAP, FRAME_CAP>
where
    C: CanBus,
    C::Error: Debug,
    D: Delay,
{
    /// Pump wakeups forever: application frames go out on the frame
    /// channel, queued commands act on the manager. Only a bus failure
    /// ends the loop.
    pub async fn drive(mut self) -> Result<(), AddressSupervisorRunError<C::Error>> {
        loop {
            match self.next_wakeup().await? {
                Wakeup::Inbound(frame) => {
                    if let Some(consumers) = self.frame_channel {
                        consumers.send(frame).await;
                    }
                }
                Wakeup::Command(SupervisorCommand::SendFrame(frame)) => {
                    self.manager
                        .send(&frame)
                        .await
                        .map_err(AddressSupervisorRunError::Send)?;
                }
            }
        }
    }

    /// Block until either the manager surfaces an application frame or a
    /// producer queues a command. Without a command channel this is just
    /// the manager's receive path.
    async fn next_wakeup(&mut self) -> Result<Wakeup, AddressSupervisorRunError<C::Error>> {
        let Some(commands) = self.command_channel else {
            return self
                .manager
                .recv()
                .await
                .map(Wakeup::Inbound)
                .map_err(AddressSupervisorRunError::Receive);
        };

        let inbound = self.manager.recv();
        let queued = commands.receive();
        pin_mut!(inbound);
        pin_mut!(queued);

        match select(inbound, queued).await {
            Either::Left((received, _)) => received
                .map(Wakeup::Inbound)
                .map_err(AddressSupervisorRunError::Receive),
            Either::Right((command, _)) => Ok(Wakeup::Command(command)),
        }
    }
}

/// Producer-side handle; cheap to pass around, never blocks the bus.
pub struct AddressHandle<'a, const CMD_CAP: usize> {
    sender: Sender<'a, CriticalSectionRawMutex, SupervisorCommand, CMD_CAP>,
}

impl<'a, const CMD_CAP: usize> AddressHandle<'a, CMD_CAP> {
    /// Hand a frame to the runner task for transmission.
    pub async fn send_frame(&self, frame: CanFrame) {
        self.sender.send(SupervisorCommand::SendFrame(frame)).await;
    }
}

/// Consumer-side receiver for the application traffic left over once the
/// manager has absorbed the address-management frames.
pub struct AddressFrames<'a, const FRAME_CAP: usize> {
    receiver: Receiver<'a, CriticalSectionRawMutex, CanFrame, FRAME_CAP>,
}

impl<'a, const FRAME_CAP: usize> AddressFrames<'a, FRAME_CAP> {
    pub async fn recv(&mut self) -> CanFrame {
        self.receiver.receive().await
    }
}

#[derive(Debug)]
pub enum AddressSupervisorRunError<E: Debug> {
    Receive(ClaimError<E>),
    Send(E),
}
