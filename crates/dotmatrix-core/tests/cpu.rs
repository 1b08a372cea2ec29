use dotmatrix_core::{bus::Bus, cartridge::Cartridge, cpu::Cpu};

/// ROM-only cartridge with `program` placed at the entry point 0x0100.
fn bus_with_program(program: &[u8]) -> Bus {
    let mut rom = vec![0u8; 0x8000];
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
    let mut bus = Bus::new(Cartridge::load(rom));
    bus.write_byte(0xFF0F, 0x00); // clear the boot-time VBlank flag
    bus
}

#[test]
fn register_pairs_round_trip() {
    let mut cpu = Cpu::new();
    cpu.set_bc(0x1234);
    assert_eq!(cpu.get_bc(), 0x1234);
    cpu.set_de(0xABCD);
    assert_eq!(cpu.get_de(), 0xABCD);
    cpu.set_hl(0x55AA);
    assert_eq!(cpu.get_hl(), 0x55AA);
    // The flag register's low nibble is forced to zero.
    cpu.set_af(0x13FF);
    assert_eq!(cpu.get_af(), 0x13F0);
}

#[test]
fn documented_cycle_costs() {
    // NOP; LD BC,d16; LD (HL),d8; CALL a16
    let mut bus = bus_with_program(&[0x00, 0x01, 0x34, 0x12, 0x36, 0xAB, 0xCD, 0x00, 0x02]);
    let mut cpu = Cpu::new();
    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.step(&mut bus), 12);
    assert_eq!(cpu.get_bc(), 0x1234);
    assert_eq!(cpu.step(&mut bus), 12);
    assert_eq!(cpu.step(&mut bus), 24);
    assert_eq!(cpu.pc, 0x0200);
}

#[test]
fn add_sets_half_and_full_carry() {
    // LD A,0x0F; ADD A,0x01; LD A,0xFF; ADD A,0x01
    let mut bus = bus_with_program(&[0x3E, 0x0F, 0xC6, 0x01, 0x3E, 0xFF, 0xC6, 0x01]);
    let mut cpu = Cpu::new();
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x10);
    assert_eq!(cpu.f, 0x20); // half carry only

    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x00);
    assert_eq!(cpu.f, 0xB0); // zero, half carry, carry
}

#[test]
fn interrupt_dispatch_pushes_pc_and_jumps_to_vector() {
    let mut bus = bus_with_program(&[0x00]);
    let mut cpu = Cpu::new();
    cpu.ime = true;
    bus.write_byte(0xFFFF, 0x01);
    bus.write_byte(0xFF0F, 0x01);

    let c = cpu.step(&mut bus); // NOP, then dispatch
    assert_eq!(c, 24);
    assert_eq!(cpu.pc, 0x0040);
    assert_eq!(cpu.sp, 0xFFFC);
    assert_eq!(bus.read_byte(0xFFFC), 0x01); // low byte of 0x0101
    assert_eq!(bus.read_byte(0xFFFD), 0x01); // high byte
    assert!(!cpu.ime);
    assert_eq!(bus.read_byte(0xFF0F) & 0x01, 0);
}

#[test]
fn lowest_interrupt_bit_wins() {
    let mut bus = bus_with_program(&[0x00]);
    let mut cpu = Cpu::new();
    cpu.ime = true;
    bus.write_byte(0xFFFF, 0x1F);
    bus.write_byte(0xFF0F, 0x14); // timer (bit 2) and joypad (bit 4) pending
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x0050);
    assert_eq!(bus.read_byte(0xFF0F) & 0x1F, 0x10);
}

#[test]
fn halt_wakes_on_new_timer_interrupt_without_dispatching() {
    let mut bus = bus_with_program(&[0x76, 0x00, 0x00]); // HALT; NOP; NOP
    let mut cpu = Cpu::new();
    bus.write_byte(0xFFFF, 0x04);

    assert_eq!(cpu.step(&mut bus), 4); // HALT
    assert!(cpu.halted);
    assert_eq!(cpu.step(&mut bus), 4); // still halted
    assert!(cpu.halted);

    bus.timer.has_irq = true;
    let c = cpu.step(&mut bus); // IF bit 2 latches; wake, no dispatch
    assert_eq!(c, 4);
    assert!(!cpu.halted);
    assert_eq!(cpu.pc, 0x0101);
    assert_eq!(bus.read_byte(0xFF0F) & 0x04, 0x04);

    cpu.step(&mut bus); // the instruction after HALT runs normally
    assert_eq!(cpu.pc, 0x0102);
    assert_eq!(bus.read_byte(0xFF0F) & 0x04, 0x04);
}

#[test]
fn halt_with_pending_interrupt_and_ime_clear_triggers_halt_bug() {
    // HALT; INC A: the byte after HALT executes twice.
    let mut bus = bus_with_program(&[0x76, 0x3C, 0x00]);
    let mut cpu = Cpu::new();
    cpu.a = 0;
    bus.write_byte(0xFFFF, 0x04);
    bus.write_byte(0xFF0F, 0x04);

    cpu.step(&mut bus);
    assert!(!cpu.halted);

    cpu.step(&mut bus); // INC A, PC does not advance
    assert_eq!(cpu.a, 1);
    assert_eq!(cpu.pc, 0x0101);

    cpu.step(&mut bus); // INC A again
    assert_eq!(cpu.a, 2);
    assert_eq!(cpu.pc, 0x0102);
}

#[test]
fn ei_takes_effect_after_following_instruction() {
    let mut bus = bus_with_program(&[0xFB, 0x00, 0x00]); // EI; NOP
    let mut cpu = Cpu::new();
    bus.write_byte(0xFFFF, 0x04);

    cpu.step(&mut bus); // EI
    assert!(!cpu.ime);

    bus.timer.has_irq = true;
    let c = cpu.step(&mut bus); // NOP; IME arms, dispatch runs immediately
    assert_eq!(c, 24);
    assert_eq!(cpu.pc, 0x0050);
    assert!(!cpu.ime);
    assert_eq!(bus.read_byte(0xFF0F) & 0x04, 0);
}

#[test]
fn di_clears_ime_and_cancels_pending_ei() {
    let mut bus = bus_with_program(&[0xFB, 0xF3, 0x00]); // EI; DI; NOP
    let mut cpu = Cpu::new();
    bus.write_byte(0xFFFF, 0x04);

    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert!(!cpu.ime);

    bus.timer.has_irq = true;
    cpu.step(&mut bus); // NOP, no dispatch
    assert_eq!(cpu.pc, 0x0103);
    assert_eq!(bus.read_byte(0xFF0F) & 0x04, 0x04);
}

#[test]
fn stop_blocks_until_joypad_state_change() {
    let mut bus = bus_with_program(&[0x10, 0x00, 0x00]);
    let mut cpu = Cpu::new();

    cpu.step(&mut bus);
    assert!(cpu.stopped);
    assert_eq!(cpu.step(&mut bus), 4);
    assert!(cpu.stopped);

    bus.joypad.set_key_state(!0x01); // press A
    bus.joypad.refresh();
    cpu.step(&mut bus);
    assert!(!cpu.stopped);
    assert!(!bus.joypad.has_state_changed); // consumed by the wake-up
}

#[test]
fn undefined_opcode_flags_fault() {
    let mut bus = bus_with_program(&[0xD3]);
    let mut cpu = Cpu::new();
    cpu.step(&mut bus);
    assert!(cpu.is_panic);
}

#[test]
fn flag_low_nibble_stays_zero_through_push_pop() {
    // LD SP,0xD000; PUSH AF; POP BC
    let mut bus = bus_with_program(&[0x31, 0x00, 0xD0, 0xF5, 0xC1]);
    let mut cpu = Cpu::new();
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    cpu.step(&mut bus);
    assert_eq!(cpu.get_bc(), cpu.get_af());
    assert_eq!(cpu.get_bc() & 0x000F, 0);
}
