use super::*;

#[cfg(test)]
mod addressing_mode_tests {
    use super::*;

    #[test]
    fn test_zero_page_addressing() {
        let (mut cpu, mut bus) = boot(&[0xA5, 0x42]); // LDA $42
        bus.write(0x42, 0xAB);

        let cycles = cpu.update(&mut bus);

        assert_eq!(cpu.a, 0xAB);
        assert_eq!(cycles, 3);
    }

    #[test]
    fn test_zero_page_x_addressing() {
        let (mut cpu, mut bus) = boot(&[0xB5, 0x42]); // LDA $42,X
        cpu.x = 0x10;
        bus.write(0x52, 0xCD);

        let cycles = cpu.update(&mut bus);

        assert_eq!(cpu.a, 0xCD);
        assert_eq!(cycles, 4);
    }

    #[test]
    fn test_zero_page_x_wraparound() {
        let (mut cpu, mut bus) = boot(&[0xB5, 0x42]);
        cpu.x = 0xFF;
        bus.write(0x41, 0xEF); // (0x42 + 0xFF) & 0xFF
        bus.write(0x0141, 0x11);

        cpu.update(&mut bus);

        assert_eq!(cpu.a, 0xEF);
    }

    #[test]
    fn test_zero_page_y_wraparound() {
        let (mut cpu, mut bus) = boot(&[0xB6, 0xF0]); // LDX $F0,Y
        cpu.y = 0x20;
        bus.write(0x10, 0x5A);

        let cycles = cpu.update(&mut bus);

        assert_eq!(cpu.x, 0x5A);
        assert_eq!(cycles, 4);
    }

    #[test]
    fn test_absolute_addressing() {
        let (mut cpu, mut bus) = boot(&[0xAD, 0x34, 0x12]); // LDA $1234
        bus.write(0x1234, 0x77);

        let cycles = cpu.update(&mut bus);

        assert_eq!(cpu.a, 0x77);
        assert_eq!(cpu.pc, 0x8003);
        assert_eq!(cycles, 4);
    }

    #[test]
    fn test_absolute_x_no_page_cross() {
        let (mut cpu, mut bus) = boot(&[0xBD, 0x00, 0x12]); // LDA $1200,X
        cpu.x = 0x10;
        bus.write(0x1210, 0x66);

        let cycles = cpu.update(&mut bus);

        assert_eq!(cpu.a, 0x66);
        assert_eq!(cycles, 4);
    }

    #[test]
    fn test_absolute_x_page_cross() {
        let (mut cpu, mut bus) = boot(&[0xBD, 0xF0, 0x12]); // LDA $12F0,X
        cpu.x = 0x20;
        bus.write(0x1310, 0x99);

        let cycles = cpu.update(&mut bus);

        assert_eq!(cpu.a, 0x99);
        assert_eq!(cycles, 5);
    }

    #[test]
    fn test_absolute_y_page_cross() {
        let (mut cpu, mut bus) = boot(&[0xB9, 0xFF, 0x00]); // LDA $00FF,Y
        cpu.y = 0x01;
        bus.write(0x0100, 0x3C);

        let cycles = cpu.update(&mut bus);

        assert_eq!(cpu.a, 0x3C);
        assert_eq!(cycles, 5);
    }

    #[test]
    fn test_absolute_x_wraps_address_space() {
        let (mut cpu, mut bus) = boot(&[0xBD, 0xFF, 0xFF]); // LDA $FFFF,X
        cpu.x = 0x02;
        bus.write(0x0001, 0x42);

        let cycles = cpu.update(&mut bus);

        assert_eq!(cpu.a, 0x42);
        assert_eq!(cycles, 5);
    }

    #[test]
    fn test_store_pays_no_page_penalty() {
        // STA $12F0,X always takes 5
        let (mut cpu, mut bus) = boot(&[0x9D, 0xF0, 0x12, 0x9D, 0x00, 0x12]);
        cpu.a = 0x5E;
        cpu.x = 0x20;

        assert_eq!(cpu.update(&mut bus), 5);
        assert_eq!(bus.read(0x1310), 0x5E);
        assert_eq!(cpu.update(&mut bus), 5);
        assert_eq!(bus.read(0x1220), 0x5E);
    }

    #[test]
    fn test_read_modify_write_pays_no_page_penalty() {
        // ASL $12F0,X and ASL $1200,X both take 7
        let (mut cpu, mut bus) = boot(&[0x1E, 0xF0, 0x12, 0x1E, 0x00, 0x12]);
        cpu.x = 0x20;
        bus.write(0x1310, 0x01);
        bus.write(0x1220, 0x40);

        assert_eq!(cpu.update(&mut bus), 7);
        assert_eq!(bus.read(0x1310), 0x02);
        assert_eq!(cpu.update(&mut bus), 7);
        assert_eq!(bus.read(0x1220), 0x80);
    }

    #[test]
    fn test_indirect_x_addressing() {
        let (mut cpu, mut bus) = boot(&[0xA1, 0x20]); // LDA ($20,X)
        cpu.x = 0x04;
        bus.write(0x24, 0x74);
        bus.write(0x25, 0x20);
        bus.write(0x2074, 0x1F);

        let cycles = cpu.update(&mut bus);

        assert_eq!(cpu.a, 0x1F);
        assert_eq!(cycles, 6);
    }

    #[test]
    fn test_indirect_x_pointer_wraps_zero_page() {
        let (mut cpu, mut bus) = boot(&[0xA1, 0xFE]); // LDA ($FE,X)
        cpu.x = 0x01;
        // Pointer at $FF/$00, not $FF/$100
        bus.write(0xFF, 0x34);
        bus.write(0x00, 0x12);
        bus.write(0x0100, 0x56);
        bus.write(0x1234, 0xA5);

        cpu.update(&mut bus);

        assert_eq!(cpu.a, 0xA5);
    }

    #[test]
    fn test_indirect_y_addressing() {
        let (mut cpu, mut bus) = boot(&[0xB1, 0x40]); // LDA ($40),Y
        cpu.y = 0x10;
        bus.write(0x40, 0x00);
        bus.write(0x41, 0x30);
        bus.write(0x3010, 0x88);

        let cycles = cpu.update(&mut bus);

        assert_eq!(cpu.a, 0x88);
        assert_eq!(cycles, 5);
    }

    #[test]
    fn test_indirect_y_page_cross() {
        let (mut cpu, mut bus) = boot(&[0xB1, 0x40]);
        cpu.y = 0x20;
        bus.write(0x40, 0xF0);
        bus.write(0x41, 0x30);
        bus.write(0x3110, 0x44);

        let cycles = cpu.update(&mut bus);

        assert_eq!(cpu.a, 0x44);
        assert_eq!(cycles, 6);
    }

    #[test]
    fn test_indirect_y_pointer_wraps_zero_page() {
        let (mut cpu, mut bus) = boot(&[0xB1, 0xFF]); // LDA ($FF),Y
        cpu.y = 0x00;
        bus.write(0xFF, 0x00);
        bus.write(0x00, 0x40);
        bus.write(0x0100, 0x50);
        bus.write(0x4000, 0x7E);

        cpu.update(&mut bus);

        assert_eq!(cpu.a, 0x7E);
    }

    #[test]
    fn test_sta_indirect_y_always_six() {
        let (mut cpu, mut bus) = boot(&[0x91, 0x40]); // STA ($40),Y
        cpu.a = 0x12;
        cpu.y = 0x01;
        bus.write(0x40, 0x00);
        bus.write(0x41, 0x30);

        assert_eq!(cpu.update(&mut bus), 6);
        assert_eq!(bus.read(0x3001), 0x12);
    }

    #[test]
    fn test_jmp_absolute() {
        let (mut cpu, mut bus) = boot(&[0x4C, 0x34, 0x12]);

        assert_eq!(cpu.update(&mut bus), 3);
        assert_eq!(cpu.pc, 0x1234);
    }

    #[test]
    fn test_jmp_indirect() {
        let (mut cpu, mut bus) = boot(&[0x6C, 0x00, 0x30]);
        bus.write(0x3000, 0x78);
        bus.write(0x3001, 0x56);

        assert_eq!(cpu.update(&mut bus), 5);
        assert_eq!(cpu.pc, 0x5678);
    }

    #[test]
    fn test_jmp_indirect_page_wrap_bug() {
        // JMP ($30FF) reads its high byte from $3000, not $3100
        let (mut cpu, mut bus) = boot(&[0x6C, 0xFF, 0x30]);
        bus.write(0x30FF, 0x40);
        bus.write(0x3000, 0x20);
        bus.write(0x3100, 0x50);

        cpu.update(&mut bus);

        assert_eq!(cpu.pc, 0x2040);
    }

    #[test]
    fn test_relative_page_compare_uses_next_instruction() {
        // BNE at $80FD: the next instruction is at $80FF, so +0 stays on
        // the page and +1 crosses.
        let (mut cpu, mut bus) = setup_cpu();
        cpu.reset(&mut bus, ResetKind::PowerUp);
        bus.load_program(&[0xD0, 0x00], 0x80FD);
        cpu.pc = 0x80FD;
        cpu.status.remove(StatusFlags::ZERO);
        assert_eq!(cpu.update(&mut bus), 3);
        assert_eq!(cpu.pc, 0x80FF);

        bus.load_program(&[0xD0, 0x01], 0x80FD);
        cpu.pc = 0x80FD;
        assert_eq!(cpu.update(&mut bus), 4);
        assert_eq!(cpu.pc, 0x8100);
    }

    #[test]
    fn test_resolve_reports_page_cross() {
        let (mut cpu, mut bus) = boot(&[0xFF, 0x12]);
        cpu.x = 0x01;

        let resolved = cpu.resolve(&mut bus, opcodes::AddressingMode::AbsoluteX);

        assert_eq!(resolved.address(), Some(0x1300));
        assert!(resolved.page_crossed);
        assert_eq!(cpu.pc, 0x8002);
    }

    #[test]
    fn test_resolve_immediate_and_implied() {
        let (mut cpu, mut bus) = boot(&[0x42]);

        let implied = cpu.resolve(&mut bus, opcodes::AddressingMode::Implied);
        assert_eq!(implied.operand, addressing::Operand::Implied);
        assert_eq!(cpu.pc, 0x8000);

        let immediate = cpu.resolve(&mut bus, opcodes::AddressingMode::Immediate);
        assert_eq!(immediate.operand, addressing::Operand::Immediate(0x42));
        assert_eq!(immediate.address(), None);
        assert_eq!(cpu.pc, 0x8001);
    }
}
